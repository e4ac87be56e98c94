use flexbuf::{Builder, FlexError, FlxValue, ValueType, MAX_JSON_DEPTH};

fn two_entry_map() -> Vec<u8> {
    let mut builder = Builder::new();
    builder
        .map(|b| {
            b.key("a")?;
            b.add_int(1)?;
            b.key("b")?;
            b.add_int(2)
        })
        .expect("map must build");
    builder.finish().expect("finish must succeed")
}

#[test]
fn short_buffers_are_invalid() {
    for bytes in [&[][..], &[0][..], &[0, 1][..]] {
        assert!(
            matches!(FlxValue::from_bytes(bytes), Err(FlexError::InvalidBuffer(_))),
            "len {} must be rejected",
            bytes.len()
        );
    }
}

#[test]
fn bad_footer_is_invalid() {
    // Root width 3 is not a width.
    assert!(matches!(
        FlxValue::from_bytes(&[0, 4, 3]),
        Err(FlexError::InvalidBuffer(_))
    ));
    // Root width 8 does not fit in a 3 byte buffer.
    assert!(matches!(
        FlxValue::from_bytes(&[0, 4, 8]),
        Err(FlexError::InvalidBuffer(_))
    ));
    // Tag 27 is unassigned.
    assert_eq!(
        FlxValue::from_bytes(&[0, 27 << 2, 1]).err(),
        Some(FlexError::UnknownType(27))
    );
}

#[test]
fn misaligned_root_is_a_bad_offset() {
    // A 2-byte Int slot starting at offset 1.
    let bytes = [0, 0, 0, 1 << 2 | 1, 2];
    let root = FlxValue::from_bytes(&bytes).unwrap();
    assert_eq!(
        root.as_long(),
        Err(FlexError::BadOffset { offset: 1, width: 2 })
    );
}

#[test]
fn offset_before_buffer_start_is_a_bad_offset() {
    let bytes = [9, 5 << 2, 1];
    let root = FlxValue::from_bytes(&bytes).unwrap();
    assert_eq!(root.value_type(), ValueType::String);
    assert_eq!(root.as_str(), Err(FlexError::BadOffset { offset: 0, width: 1 }));
}

#[test]
fn unterminated_strings_and_keys_are_bad_offsets() {
    // String "a" with its terminator replaced by the root slot.
    let bytes = [1, b'a', 1, 5 << 2, 1];
    let root = FlxValue::from_bytes(&bytes).unwrap();
    assert!(matches!(root.as_str(), Err(FlexError::BadOffset { .. })));

    // Key with no zero byte anywhere after it.
    let bytes = [b'a', 1, 4 << 2, 1];
    let root = FlxValue::from_bytes(&bytes).unwrap();
    assert_eq!(root.value_type(), ValueType::Key);
    assert_eq!(root.as_str(), Err(FlexError::BadOffset { offset: 0, width: 1 }));
}

#[test]
fn truncated_vector_is_a_bad_offset() {
    let mut builder = Builder::new();
    builder
        .vector(|b| {
            b.add_int(1)?;
            b.add_string("two")
        })
        .unwrap();
    let bytes = builder.finish().unwrap();
    let root = FlxValue::from_bytes(&bytes).unwrap();
    let vector = root.as_vector().unwrap();
    let second = vector.get(1).unwrap();

    // Keep the footer but claim a much longer vector.
    let mut tampered = bytes.clone();
    let len_at = root.as_vector().unwrap().get(0).unwrap().buffer_offset() - 1;
    tampered[len_at] = 200;
    let vector = FlxValue::from_bytes(&tampered).unwrap().as_vector().unwrap();
    assert_eq!(vector.len(), 200);
    assert!(matches!(vector.get(150), Err(FlexError::BadOffset { .. })));
    assert_eq!(second.as_str(), Ok("two"));
}

#[test]
fn map_layout_is_stable() {
    assert_eq!(
        two_entry_map(),
        vec![
            b'a', 0, b'b', 0, // keys
            2, 5, 4, // key vector: len, slots
            2, 1, 2, // keys offset, keys width, len
            1, 2, // values
            1 << 2, 1 << 2, // value types
            4, 9 << 2, 1, // root
        ]
    );
}

#[test]
fn unsorted_keys_are_reported() {
    let mut bytes = two_entry_map();
    bytes.swap(0, 2);
    let map = FlxValue::from_bytes(&bytes).unwrap().as_map().unwrap();

    let mut entries = map.iter();
    let (key, value) = entries.next().unwrap().unwrap();
    assert_eq!(key, "b");
    assert_eq!(value.as_long(), Ok(1));
    assert_eq!(entries.next().unwrap().err(), Some(FlexError::UnsortedKeys(1)));
    assert!(entries.next().is_none());

    assert_eq!(map.to_json(true), Err(FlexError::UnsortedKeys(1)));

    // "b" sits first, so the search walks past it.
    assert_eq!(map.get("b").err(), Some(FlexError::UnsortedKeys(1)));
    assert_eq!(map.has_key("b"), Err(FlexError::UnsortedKeys(1)));
    assert_eq!(map.key_index("a"), Ok(Some(1)));
}

#[test]
fn narrow_float_is_a_bad_offset() {
    // Float packed with a one-byte width.
    let bytes = [0, 3 << 2, 1];
    let root = FlxValue::from_bytes(&bytes).unwrap();
    assert_eq!(root.value_type(), ValueType::Float);
    let bad = FlexError::BadOffset { offset: 0, width: 1 };
    assert_eq!(root.as_double(), Err(bad.clone()));
    assert_eq!(root.to_json(true), Err(bad));
}

#[test]
fn self_referencing_vector_hits_the_depth_limit() {
    // A one-element vector whose only element points back at the vector.
    let bytes = [1, 0, 10 << 2, 2, 10 << 2, 1];
    let root = FlxValue::from_bytes(&bytes).unwrap();
    assert_eq!(root.index(0).unwrap().value_type(), ValueType::Vector);
    assert_eq!(root.to_json(true), Err(FlexError::DepthLimit(MAX_JSON_DEPTH)));
    assert_eq!(
        root.to_pretty_json(true),
        Err(FlexError::DepthLimit(MAX_JSON_DEPTH))
    );
}

#[test]
fn bad_element_type_byte() {
    let mut builder = Builder::new();
    builder
        .vector(|b| {
            b.add_int(1)?;
            b.add_null()
        })
        .unwrap();
    let mut bytes = builder.finish().unwrap();
    // [len][1][0][Int][Null][root slot][Vector][1]
    assert_eq!(bytes[4], 0);
    bytes[4] = 30 << 2;
    let vector = FlxValue::from_bytes(&bytes).unwrap().as_vector().unwrap();
    assert_eq!(vector.get(1).err(), Some(FlexError::UnknownType(30)));
    assert!(vector.get(0).is_ok());
}
