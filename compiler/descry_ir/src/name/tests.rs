use super::*;

#[test]
fn shard_and_local_survive_packing() {
    let name = Name::new(7, 4242);
    assert_eq!(name.shard(), 7);
    assert_eq!(name.local(), 4242);
    assert_eq!(name.raw(), (7 << 28) | 4242);

    let last = Name::new(15, Name::MAX_LOCAL);
    assert_eq!(last.shard(), Name::NUM_SHARDS - 1);
    assert_eq!(last.local(), Name::MAX_LOCAL as usize);
}

#[test]
fn default_name_is_the_empty_string() {
    assert_eq!(Name::default(), Name::EMPTY);
    assert_eq!(format!("{:?}", Name::EMPTY), "Name(0:0)");
}
