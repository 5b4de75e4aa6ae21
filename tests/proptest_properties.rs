use proptest::prelude::*;
use xfth::format::{ByteReader, EntryLayout, EntryStatus, RawEntry};
use xfth::hash::sstr_hash;
use xfth::snapshot::{self, Entry, EntrySet};

fn arb_status() -> impl Strategy<Value = EntryStatus> {
    prop_oneof![
        Just(EntryStatus::AddUpdate),
        Just(EntryStatus::Remove),
        Just(EntryStatus::RemoveHotfixes),
        Just(EntryStatus::NotPublic),
    ]
}

fn arb_raw_entry() -> impl Strategy<Value = RawEntry> {
    (
        any::<i32>(),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
        arb_status(),
        proptest::collection::vec(any::<u8>(), 0..512),
    )
        .prop_map(
            |(push_id, reserved, table_hash, record_id, status, payload)| RawEntry {
                push_id,
                reserved: Some(reserved),
                table_hash,
                record_id,
                status,
                payload,
            },
        )
}

fn arb_entry() -> impl Strategy<Value = Entry> {
    (
        -1i32..1000,
        "[A-Za-z_][A-Za-z0-9_]{0,30}",
        any::<u32>(),
        arb_status(),
        proptest::collection::vec(any::<u8>(), 0..64),
    )
        .prop_map(|(push_id, table_name, record_id, status, payload)| Entry {
            push_id,
            table_name,
            record_id,
            status,
            payload,
        })
}

proptest! {
    #[test]
    fn prop_hash_never_zero(s in "\\PC{0,64}") {
        prop_assert_ne!(sstr_hash(&s), 0);
    }

    #[test]
    fn prop_hash_case_insensitive(s in "[a-zA-Z0-9_/\\\\]{0,64}") {
        prop_assert_eq!(sstr_hash(&s.to_uppercase()), sstr_hash(&s.to_lowercase()));
    }

    #[test]
    fn prop_slash_backslash_equivalent(s in "[a-z]{0,16}", t in "[a-z]{0,16}") {
        let with_slash = format!("{s}/{t}");
        let with_backslash = format!("{s}\\{t}");
        prop_assert_eq!(sstr_hash(&with_slash), sstr_hash(&with_backslash));
    }

    #[test]
    fn prop_record_roundtrip_layout_b(entry in arb_raw_entry()) {
        let mut buf = Vec::new();
        entry.encode(EntryLayout::B, &mut buf);

        let mut r = ByteReader::new(&buf);
        let decoded = RawEntry::decode(&mut r, EntryLayout::B).unwrap();
        prop_assert!(r.is_empty());
        prop_assert_eq!(decoded, entry);
    }

    #[test]
    fn prop_record_roundtrip_layout_a(mut entry in arb_raw_entry()) {
        entry.reserved = None;
        let mut buf = Vec::new();
        entry.encode(EntryLayout::A, &mut buf);

        let mut r = ByteReader::new(&buf);
        let decoded = RawEntry::decode(&mut r, EntryLayout::A).unwrap();
        prop_assert!(r.is_empty());
        prop_assert_eq!(decoded, entry);
    }

    #[test]
    fn prop_snapshot_codec_roundtrip(entries in proptest::collection::vec(arb_entry(), 0..40)) {
        let set: EntrySet = entries.into_iter().collect();
        let bytes = snapshot::encode_set(&set).unwrap();
        let decoded = snapshot::decode_set(&bytes).unwrap();
        prop_assert_eq!(decoded, set);
    }

    #[test]
    fn prop_decoder_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut r = ByteReader::new(&data);
        while !r.is_empty() {
            if RawEntry::decode(&mut r, EntryLayout::B).is_err() {
                break;
            }
        }
    }
}
