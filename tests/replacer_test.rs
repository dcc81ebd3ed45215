use tarn::buffer::{ClockReplacer, LruReplacer, Replacer};
use tarn::FrameId;

#[test]
fn test_lru_replacer_victim_order() {
    let replacer = LruReplacer::new(3);

    replacer.unpin(FrameId::new(1));
    replacer.unpin(FrameId::new(2));
    replacer.unpin(FrameId::new(3));
    assert_eq!(replacer.size(), 3);

    assert_eq!(replacer.victim(), Some(FrameId::new(1)));

    replacer.unpin(FrameId::new(1));
    assert_eq!(replacer.victim(), Some(FrameId::new(2)));
}

#[test]
fn test_lru_replacer_pin() {
    let replacer = LruReplacer::new(4);

    replacer.unpin(FrameId::new(1));
    replacer.unpin(FrameId::new(2));
    replacer.unpin(FrameId::new(3));

    replacer.pin(FrameId::new(2));
    assert_eq!(replacer.size(), 2);

    assert_eq!(replacer.victim(), Some(FrameId::new(1)));
    assert_eq!(replacer.victim(), Some(FrameId::new(3)));
    assert_eq!(replacer.victim(), None);
}

#[test]
fn test_lru_replacer_empty_victim() {
    let replacer = LruReplacer::new(4);
    assert_eq!(replacer.victim(), None);
    assert_eq!(replacer.size(), 0);
}

#[test]
fn test_clock_replacer_second_chance() {
    let replacer = ClockReplacer::new(3);

    replacer.unpin(FrameId::new(1));
    replacer.unpin(FrameId::new(2));
    replacer.unpin(FrameId::new(3));
    assert_eq!(replacer.size(), 3);

    // Every reference bit is set, so the sweep clears all three and then
    // selects the frame at the hand.
    assert_eq!(replacer.victim(), Some(FrameId::new(1)));

    replacer.unpin(FrameId::new(1));
    assert_eq!(replacer.victim(), Some(FrameId::new(2)));
    assert_eq!(replacer.victim(), Some(FrameId::new(3)));
    assert_eq!(replacer.victim(), Some(FrameId::new(1)));
    assert_eq!(replacer.victim(), None);
}

#[test]
fn test_clock_replacer_pin() {
    let replacer = ClockReplacer::new(3);

    replacer.unpin(FrameId::new(1));
    replacer.unpin(FrameId::new(2));
    replacer.pin(FrameId::new(1));

    assert_eq!(replacer.size(), 1);
    assert_eq!(replacer.victim(), Some(FrameId::new(2)));
    assert_eq!(replacer.victim(), None);
}

#[test]
fn test_replacer_trait_objects() {
    let policies: Vec<Box<dyn Replacer>> =
        vec![Box::new(LruReplacer::new(4)), Box::new(ClockReplacer::new(4))];

    for replacer in policies {
        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(1));
        assert_eq!(replacer.size(), 2);

        // A frame absent from the replacer can never be victimized.
        replacer.pin(FrameId::new(0));
        assert_eq!(replacer.victim(), Some(FrameId::new(1)));
        assert_eq!(replacer.victim(), None);
    }
}
