//! Flag registry tests.
//!
//! These verify:
//! - Codec round-trips for every built-in type's default
//! - Idempotent default bootstrapping
//! - Extending the catalogue with a custom flag type

use proptest::prelude::*;

use zone_protect::flags::standard::ids;
use zone_protect::{
    Capabilities, Flag, FlagError, FlagManager, FlagType, FlagValue, PayloadKind,
    StandardFlagType,
};

#[test]
fn test_default_round_trip_for_every_type() {
    let flags = FlagManager::standard_in_memory();
    let mut checked = 0;
    for ty in flags.get_registered(Capabilities::SERIALIZABLE) {
        let Some(default) = ty.default_flag() else {
            continue;
        };
        let encoded = flags.encode_flag(&default).unwrap();
        assert_eq!(flags.decode_flag(ty.id(), &encoded).unwrap(), default);
        checked += 1;
    }
    assert!(checked > 0);
}

#[test]
fn test_bootstrap_twice_never_overwrites() {
    let mut flags = FlagManager::standard_in_memory();
    let first = flags.bootstrap_defaults();
    assert!(first.succeeded > 0);

    let mut tnt = flags.default_flag(&ids::TNT_DEFUSE.into()).unwrap().clone();
    tnt.as_enabled_mut().unwrap().set_enabled(Some(true));
    flags.set_default(tnt.clone()).unwrap();

    let second = flags.bootstrap_defaults();
    assert_eq!(second.succeeded, 0);
    assert_eq!(flags.default_flag(&ids::TNT_DEFUSE.into()), Some(&tnt));
}

#[test]
fn test_custom_type_extends_catalogue() {
    let mut flags = FlagManager::standard_in_memory();
    flags
        .register(
            StandardFlagType::new("max_residents", "Max Residents", PayloadKind::Int)
                .with_default(FlagValue::Int(8)),
        )
        .unwrap();

    flags.bootstrap_defaults();
    let default = flags.default_flag(&"max_residents".into()).unwrap();
    assert_eq!(default.value().as_int(), Some(8));
    assert!(default.as_enabled().is_none());

    assert_eq!(
        flags.register(StandardFlagType::new("max_residents", "Again", PayloadKind::Int)),
        Err(FlagError::DuplicateTypeId("max_residents".into()))
    );
}

#[test]
fn test_unknown_type_cannot_be_encoded() {
    let flags = FlagManager::standard_in_memory();
    let stray = Flag::new("no_such_flag", FlagValue::Unit);
    assert_eq!(
        flags.encode_flag(&stray),
        Err(FlagError::UnknownType("no_such_flag".into()))
    );
}

proptest! {
    #[test]
    fn text_flags_round_trip(text in ".{0,64}") {
        let flags = FlagManager::standard_in_memory();
        let flag = Flag::new(ids::GREETINGS, FlagValue::Text(text));
        let encoded = flags.encode_flag(&flag).unwrap();
        prop_assert_eq!(flags.decode_flag(&ids::GREETINGS.into(), &encoded).unwrap(), flag);
    }

    #[test]
    fn enabled_overrides_round_trip(explicit in proptest::option::of(any::<bool>())) {
        let flags = FlagManager::standard_in_memory();
        let ty = flags.get(&ids::BLOCK_PLACE.into()).unwrap();
        let mut flag = ty.default_flag().unwrap();
        flag.as_enabled_mut().unwrap().set_enabled(explicit);
        let encoded = flags.encode_flag(&flag).unwrap();
        prop_assert_eq!(flags.decode_flag(ty.id(), &encoded).unwrap(), flag);
    }
}
