//! Integration tests for object factories: allocation, change tracking,
//! attachment, enumeration shifts and update enumeration.

mod common;

use common::{init_logging, sample_document, typed_dict};
use pdf_incremental::{Dictionary, Error, Object, ObjectFactory, ObjectRef};

mod allocation_tests {
    use super::*;

    #[test]
    fn test_new_objects_are_modified() {
        init_logging();
        let factory = ObjectFactory::new(1);
        assert!(!factory.is_modified());

        let obj = factory.new_object(Dictionary::new()).unwrap();
        assert_eq!(obj.object_number(), 1);
        assert_eq!(obj.generation(), 0);
        assert!(factory.is_modified());
    }

    #[test]
    fn test_new_stream_object() {
        let factory = ObjectFactory::new(1);
        let stream = factory.new_stream_object(&b"0 0 m 10 10 l S"[..]).unwrap();

        let value = stream.value().unwrap();
        let stream = value.as_stream().unwrap();
        assert_eq!(stream.len(), 15);
        assert!(stream.dict.is_empty());
    }

    #[test]
    fn test_set_object_count() {
        let factory = ObjectFactory::new(1);
        factory.set_object_count(40);
        assert_eq!(factory.new_object(Object::Null).unwrap().object_number(), 40);
    }
}

mod modification_tests {
    use super::*;

    #[test]
    fn test_mark_modified_by_owner() {
        let factory = ObjectFactory::new(1);
        let obj = factory.load_object(ObjectRef::new(7, 0), Object::Numeric(1.0)).unwrap();
        assert!(!factory.is_modified());

        factory.mark_modified(&obj).unwrap();
        assert!(factory.is_modified());

        let records = factory.list_modified_objects(None).unwrap();
        assert_eq!(records[&7].payload_str().as_deref(), Some("7 0 obj \n1\nendobj\n"));
    }

    #[test]
    fn test_mark_modified_foreign_object() {
        let a = ObjectFactory::new(1);
        let b = ObjectFactory::new(1);
        let obj = b.new_object(Object::Null).unwrap();

        match a.mark_modified(&obj) {
            Err(Error::ForeignObject { object, owner, factory }) => {
                assert_eq!(object, ObjectRef::new(1, 0));
                assert_eq!(owner, b.id());
                assert_eq!(factory, a.id());
            },
            other => panic!("expected ForeignObject, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_reports_bumped_generation() {
        let factory = ObjectFactory::new(1);
        let kept = factory.new_object(Object::Boolean(true)).unwrap();
        let gone = factory.new_object(Object::Boolean(false)).unwrap();
        factory.remove(&gone).unwrap();

        let records = factory.list_modified_objects(None).unwrap();
        assert_eq!(records.len(), 2);

        let live = &records[&kept.object_number()];
        assert!(!live.removed);
        assert_eq!(live.generation, 0);

        let freed = &records[&gone.object_number()];
        assert!(freed.removed);
        assert_eq!(freed.generation, 1);
        assert!(freed.payload.is_none());
    }

    #[test]
    fn test_removed_generation_saturates() {
        let factory = ObjectFactory::new(1);
        let obj = factory.load_object(ObjectRef::new(3, 65535), Object::Null).unwrap();
        factory.remove(&obj).unwrap();

        let records = factory.list_modified_objects(None).unwrap();
        assert_eq!(records[&3].generation, 65535);
    }

    #[test]
    fn test_set_value_through_alias_marks_modified() {
        let factory = ObjectFactory::new(1);
        let obj = factory.load_object(ObjectRef::new(2, 0), typed_dict("Font")).unwrap();
        let alias = factory.fetch_object("2 0 R").unwrap();

        alias.set_value(typed_dict("FontDescriptor")).unwrap();

        assert!(factory.is_modified());
        assert_eq!(obj.value().unwrap().dict_type(), Some("FontDescriptor"));
    }
}

mod attachment_tests {
    use super::*;

    #[test]
    fn test_object_count_excludes_shared_zero() {
        let root = ObjectFactory::new(4);
        let a = ObjectFactory::new(3);
        let b = ObjectFactory::new(1);
        root.attach(&a).unwrap();
        root.attach(&b).unwrap();

        assert_eq!(root.object_count(), 4 + 2);
    }

    #[test]
    fn test_is_modified_sees_children() {
        let root = ObjectFactory::new(1);
        let child = ObjectFactory::new(1);
        let grandchild = ObjectFactory::new(1);
        root.attach(&child).unwrap();
        child.attach(&grandchild).unwrap();
        assert!(!root.is_modified());

        grandchild.new_object(Object::Null).unwrap();
        assert!(root.is_modified());
        assert!(child.is_modified());
    }

    #[test]
    fn test_attach_on_closed_factory() {
        let root = ObjectFactory::new(1);
        root.close();
        assert!(matches!(
            root.attach(&ObjectFactory::new(1)),
            Err(Error::InvalidContext(_))
        ));
    }
}

mod shift_tests {
    use super::*;

    #[test]
    fn test_nested_shift() {
        let root = ObjectFactory::new(3);
        let fonts = ObjectFactory::new(4);
        let pages = ObjectFactory::new(2);
        root.attach(&fonts).unwrap();
        root.attach(&pages).unwrap();

        assert_eq!(root.get_enumeration_shift(&root).unwrap(), 0);
        assert_eq!(root.get_enumeration_shift(&fonts).unwrap(), 2);
        assert_eq!(root.get_enumeration_shift(&pages).unwrap(), 5);
        // Relative to an intermediate factory
        assert_eq!(fonts.calculate_shift(&pages), None);
    }

    #[test]
    fn test_shift_stable_until_cleaned() {
        let root = ObjectFactory::new(1);
        let first = ObjectFactory::new(1);
        let second = ObjectFactory::new(1);
        root.attach(&first).unwrap();
        root.attach(&second).unwrap();

        let before = root.get_enumeration_shift(&second).unwrap();
        assert_eq!(before, 0);
        first.new_object(Object::Null).unwrap();
        assert_eq!(root.get_enumeration_shift(&second).unwrap(), before);

        root.clean_enumeration_shift_cache();
        assert_eq!(root.get_enumeration_shift(&second).unwrap(), 1);
    }

    #[test]
    fn test_clean_cache_recurses() {
        let root = ObjectFactory::new(1);
        let child = ObjectFactory::new(1);
        let leaf = ObjectFactory::new(1);
        root.attach(&child).unwrap();
        child.attach(&leaf).unwrap();

        assert_eq!(child.calculate_shift(&leaf), Some(0));
        child.new_object(Object::Null).unwrap();
        root.clean_enumeration_shift_cache();
        assert_eq!(child.calculate_shift(&leaf), Some(1));
    }
}

mod enumeration_tests {
    use super::*;

    #[test]
    fn test_end_to_end_two_factories() {
        init_logging();
        let f0 = ObjectFactory::new(1);
        let f1 = ObjectFactory::new(1);
        f0.attach(&f1).unwrap();

        assert_eq!(f0.object_count(), 1);
        assert_eq!(f0.get_enumeration_shift(&f1).unwrap(), 0);

        let page = f0.new_object(typed_dict("Page")).unwrap();
        let content = f1.new_stream_object(&b"BT ET"[..]).unwrap();
        page.update(|v| {
            if let Some(dict) = v.as_dict_mut() {
                dict.set("Contents", content.clone());
            }
        })
        .unwrap();
        assert_eq!(f0.object_count(), 3);

        // Cached before allocation; enumeration recomputes it.
        assert_eq!(f0.get_enumeration_shift(&f1).unwrap(), 0);

        let records = f0.list_modified_objects(None).unwrap();
        assert_eq!(records.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(
            records[&1].payload_str().as_deref(),
            Some("1 0 obj \n<</Type /Page /Contents 2 0 R >>\nendobj\n")
        );
        assert_eq!(
            records[&2].payload_str().as_deref(),
            Some("2 0 obj \n<</Length 5 >>\nstream\nBT ET\nendstream\nendobj\n")
        );
        assert_eq!(f0.get_enumeration_shift(&f1).unwrap(), 1);
    }

    #[test]
    fn test_nested_attach_after_unreachable_lookup() {
        let root = ObjectFactory::new(1);
        let mid = ObjectFactory::new(1);
        let leaf = ObjectFactory::new(1);
        root.attach(&mid).unwrap();
        assert_eq!(root.calculate_shift(&leaf), None);

        mid.attach(&leaf).unwrap();
        root.new_object(Object::Null).unwrap();
        leaf.new_object(Object::Boolean(true)).unwrap();

        let records = root.list_modified_objects(None).unwrap();
        assert_eq!(records.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(
            records[&2].payload_str().as_deref(),
            Some("2 0 obj \ntrue\nendobj\n")
        );
        assert_eq!(root.calculate_shift(&leaf), Some(1));
    }

    #[test]
    fn test_records_sorted_across_children() {
        let root = ObjectFactory::new(1);
        let fonts = ObjectFactory::new(1);
        let images = ObjectFactory::new(1);
        root.attach(&fonts).unwrap();
        root.attach(&images).unwrap();

        for _ in 0..2 {
            images.new_object(Object::Null).unwrap();
        }
        for _ in 0..3 {
            fonts.new_object(Object::Null).unwrap();
        }
        root.new_object(Object::Null).unwrap();

        let records = root.list_modified_objects(None).unwrap();
        assert_eq!(records.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
        for (key, record) in &records {
            assert_eq!(*key, record.object_number);
        }
    }

    #[test]
    fn test_shared_child_enumerated_once() {
        let root = ObjectFactory::new(1);
        let left = ObjectFactory::new(1);
        let right = ObjectFactory::new(1);
        let shared = ObjectFactory::new(1);
        root.attach(&left).unwrap();
        root.attach(&right).unwrap();
        left.attach(&shared).unwrap();
        right.attach(&shared).unwrap();

        shared.new_object(Object::Null).unwrap();
        let records = root.list_modified_objects(None).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_child_enumerated_relative_to_root() {
        let root = ObjectFactory::new(5);
        let child = ObjectFactory::new(1);
        root.attach(&child).unwrap();
        let obj = child.new_object(Object::Null).unwrap();

        let records = child.list_modified_objects(Some(&root)).unwrap();
        assert_eq!(records.keys().copied().collect::<Vec<_>>(), vec![5]);
        assert_eq!(obj.object_number(), 1);
    }

    #[test]
    fn test_unattached_child_with_root_fails() {
        let root = ObjectFactory::new(1);
        let stranger = ObjectFactory::new(1);
        stranger.new_object(Object::Null).unwrap();

        assert!(matches!(
            stranger.list_modified_objects(Some(&root)),
            Err(Error::InvalidContext(_))
        ));
    }
}

mod resolution_tests {
    use super::*;

    #[test]
    fn test_resolve_loads_once() {
        let factory = ObjectFactory::with_context(6, sample_document());
        let first = factory.resolve(ObjectRef::new(5, 0)).unwrap();
        let second = factory.resolve(ObjectRef::new(5, 0)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.value().unwrap().dict_type(), Some("Font"));
        assert!(!factory.is_modified());
        assert_eq!(factory.fetch_object("5 0 R"), Some(first));
    }

    #[test]
    fn test_resolve_missing_object() {
        let factory = ObjectFactory::with_context(6, sample_document());
        assert!(matches!(
            factory.resolve(ObjectRef::new(42, 0)),
            Err(Error::UnresolvedReference(r)) if r == ObjectRef::new(42, 0)
        ));
    }

    #[test]
    fn test_modified_parsed_object_keeps_references() {
        let factory = ObjectFactory::with_context(6, sample_document());
        let page = factory.resolve(ObjectRef::new(3, 0)).unwrap();
        page.update(|v| {
            if let Some(dict) = v.as_dict_mut() {
                dict.set("Rotate", 90);
            }
        })
        .unwrap();

        let records = factory.list_modified_objects(None).unwrap();
        assert_eq!(
            records[&3].payload_str().as_deref(),
            Some("3 0 obj \n<</Type /Page /Parent 2 0 R /Resources 4 0 R /Rotate 90 >>\nendobj\n")
        );
    }

    #[test]
    fn test_close_severs_handles() {
        let factory = ObjectFactory::with_context(6, sample_document());
        let page = factory.resolve(ObjectRef::new(3, 0)).unwrap();
        factory.close();

        assert!(factory.context().is_none());
        assert!(factory.fetch_object("3 0 R").is_none());
        assert!(matches!(page.value(), Err(Error::InvalidContext(_))));
        assert!(matches!(page.factory(), Err(Error::InvalidContext(_))));
        assert!(matches!(
            factory.resolve(ObjectRef::new(3, 0)),
            Err(Error::InvalidContext(_))
        ));
    }
}
