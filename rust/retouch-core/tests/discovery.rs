//! End-to-end discovery scenarios against the in-memory DOM.
mod discovery {
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use retouch_core::helpers::{MemoryDom, RecordingFactory};
    use retouch_core::{Dom, SurfaceWatcher, Visibility};

    fn watch(
        dom: &MemoryDom,
    ) -> Result<(SurfaceWatcher<MemoryDom, RecordingFactory>, RecordingFactory)> {
        let factory = RecordingFactory::new(dom);
        let watcher = SurfaceWatcher::new(dom.clone(), factory.clone());
        watcher.start()?;
        Ok((watcher, factory))
    }

    #[test_log::test]
    fn it_attaches_to_a_textarea_inserted_after_start_within_one_flush() -> Result<()> {
        let dom = MemoryDom::new();
        let (_watcher, factory) = watch(&dom)?;
        assert!(factory.created().is_empty());

        let textarea = dom.append_element(dom.body_of(dom.top_document()), "textarea");
        dom.flush();

        assert_eq!(factory.created(), vec![textarea]);
        assert_eq!(factory.controls().len(), 1);
        Ok(())
    }

    #[test_log::test]
    fn it_attaches_to_editable_descendants_of_an_inserted_subtree() -> Result<()> {
        let dom = MemoryDom::new();
        let (_watcher, factory) = watch(&dom)?;

        let top = dom.top_document();
        let form = dom.create_element(top, "form");
        let comment = dom.create_element(top, "textarea");
        dom.append_child(form, comment);
        let editor = dom.create_element(top, "div");
        dom.set_attribute_value(editor, "contenteditable", "true");
        dom.append_child(form, editor);
        let nested = dom.create_element(top, "div");
        dom.set_attribute_value(nested, "contenteditable", "true");
        dom.append_child(editor, nested);

        dom.append_child(dom.body_of(top), form);
        dom.flush();

        assert_eq!(factory.created(), vec![comment, editor]);
        Ok(())
    }

    #[test_log::test]
    fn it_creates_one_control_per_surface_across_repeated_passes() -> Result<()> {
        let dom = MemoryDom::new();
        let top = dom.top_document();
        let body = dom.body_of(top);
        let first = dom.append_element(body, "textarea");
        let second = dom.append_element(body, "textarea");
        let (watcher, factory) = watch(&dom)?;

        for _ in 0..3 {
            watcher.scan(&top);
            watcher.discover_frames(&top);
            watcher.handle_additions(&top, vec![first, second, body]);
            dom.flush();
        }

        assert_eq!(factory.count_for(first), 1);
        assert_eq!(factory.count_for(second), 1);
        assert_eq!(factory.controls().len(), 2);
        Ok(())
    }

    #[test_log::test]
    fn it_skips_hidden_surfaces_on_every_later_pass() -> Result<()> {
        let dom = MemoryDom::new();
        let top = dom.top_document();
        let hidden = dom.append_element(dom.body_of(top), "textarea");
        dom.set_visibility(
            hidden,
            Visibility {
                display_none: true,
                hidden: false,
            },
        );
        let (watcher, factory) = watch(&dom)?;

        assert!(watcher.is_processed(&hidden));
        assert!(factory.controls().is_empty());

        dom.set_visibility(hidden, Visibility::VISIBLE);
        watcher.scan(&top);

        assert!(factory.created().is_empty());
        Ok(())
    }

    #[test_log::test]
    fn it_attaches_inside_frames_present_at_start() -> Result<()> {
        let dom = MemoryDom::new();
        let top = dom.top_document();
        let (frame, frame_document) = dom.append_frame(dom.body_of(top));
        let inside = dom.append_element(dom.body_of(frame_document), "textarea");

        let (watcher, factory) = watch(&dom)?;

        assert_eq!(factory.created(), vec![inside]);
        assert!(watcher.is_frame_watched(&frame));

        // Controls are hosted by the top document, not the frame.
        assert_eq!(factory.controls().len(), 1);
        assert!(dom.children(dom.body_of(frame_document)).contains(&inside));
        Ok(())
    }

    #[test_log::test]
    fn it_watches_frames_inserted_after_start() -> Result<()> {
        let dom = MemoryDom::new();
        let top = dom.top_document();
        let (watcher, factory) = watch(&dom)?;

        let (frame, frame_document) = dom.create_frame(top);
        let early = dom.append_element(dom.body_of(frame_document), "textarea");
        dom.append_child(dom.body_of(top), frame);
        dom.flush();

        assert!(watcher.is_frame_watched(&frame));
        assert_eq!(factory.created(), vec![early]);

        let late = dom.append_element(dom.body_of(frame_document), "div");
        dom.set_attribute_value(late, "contenteditable", "true");
        dom.flush();

        assert_eq!(factory.created(), vec![early, late]);
        assert_eq!(watcher.observer_count(), 2);
        Ok(())
    }

    #[test_log::test]
    fn it_finds_frames_nested_inside_an_inserted_wrapper() -> Result<()> {
        let dom = MemoryDom::new();
        let top = dom.top_document();
        let (watcher, factory) = watch(&dom)?;

        let wrapper = dom.create_element(top, "div");
        let (frame, frame_document) = dom.create_frame(top);
        dom.append_child(wrapper, frame);
        let inside = dom.append_element(dom.body_of(frame_document), "textarea");
        dom.append_child(dom.body_of(top), wrapper);
        dom.flush();

        assert!(watcher.is_frame_watched(&frame));
        assert_eq!(factory.created(), vec![inside]);
        Ok(())
    }

    #[test_log::test]
    fn it_follows_frames_three_levels_deep() -> Result<()> {
        let dom = MemoryDom::new();
        let top = dom.top_document();
        let (_, outer) = dom.append_frame(dom.body_of(top));
        let (_, middle) = dom.append_frame(dom.body_of(outer));
        let (_, inner) = dom.append_frame(dom.body_of(middle));
        let deep = dom.append_element(dom.body_of(inner), "textarea");

        let (watcher, factory) = watch(&dom)?;
        assert_eq!(factory.created(), vec![deep]);
        assert_eq!(watcher.observer_count(), 4);

        // A frame inserted inside a watched frame is discovered by that
        // frame's own observer.
        let (late_frame, late_document) = dom.create_frame(inner);
        let later = dom.append_element(dom.body_of(late_document), "textarea");
        dom.append_child(dom.body_of(inner), late_frame);
        dom.flush();

        assert!(watcher.is_frame_watched(&late_frame));
        assert_eq!(factory.created(), vec![deep, later]);
        Ok(())
    }

    #[test_log::test]
    fn it_never_throws_or_attaches_inside_cross_origin_frames() -> Result<()> {
        let dom = MemoryDom::new();
        let top = dom.top_document();
        let blocked = dom.append_cross_origin_frame(dom.body_of(top));
        let (watcher, factory) = watch(&dom)?;

        assert!(!watcher.is_frame_watched(&blocked));

        let another = dom.create_cross_origin_frame(top);
        dom.append_child(dom.body_of(top), another);
        let outside = dom.append_element(dom.body_of(top), "textarea");
        dom.flush();

        assert!(!watcher.is_frame_watched(&another));
        assert_eq!(factory.created(), vec![outside]);
        assert_eq!(watcher.observer_count(), 1);
        Ok(())
    }

    #[test_log::test]
    fn it_stops_reacting_after_shutdown() -> Result<()> {
        let dom = MemoryDom::new();
        let top = dom.top_document();
        dom.append_element(dom.body_of(top), "textarea");
        let (watcher, factory) = watch(&dom)?;

        watcher.shutdown();
        assert!(factory.controls().is_empty());

        dom.append_element(dom.body_of(top), "textarea");
        dom.flush();
        assert_eq!(factory.created().len(), 1);
        Ok(())
    }
}
