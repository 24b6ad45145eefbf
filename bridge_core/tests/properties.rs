use bridge_core::fit::FitStatus;
use bridge_core::sample::{FULL_SCALE, SensorSample};
use bridge_core::{PlayerId, SensorMessage, SessionState};
use proptest::prelude::*;

fn channel() -> impl Strategy<Value = f32> {
    prop_oneof![
        4 => -1.0f32..1.0f32,
        1 => Just(f32::NAN),
    ]
}

proptest! {
    #[test]
    fn nan_channels_are_zeroed_and_others_kept(readings in prop::array::uniform4(channel())) {
        let s = SensorSample::new(readings);
        for (stored, input) in s.readings().iter().zip(readings.iter()) {
            prop_assert!(!stored.is_nan());
            if input.is_nan() {
                prop_assert_eq!(*stored, 0.0);
            } else {
                prop_assert_eq!(stored.to_bits(), input.to_bits());
            }
        }
    }

    #[test]
    fn means_at_or_above_full_scale_saturate(readings in prop::array::uniform4(0.0f32..5.0f32)) {
        let s = SensorSample::new(readings);
        prop_assume!(s.mean() >= FULL_SCALE);
        prop_assert_eq!(s.encode(), 255);
    }

    #[test]
    fn encoding_is_monotonic_in_the_mean(a in 0.0f32..0.3f32, b in 0.0f32..0.3f32) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(SensorSample::new([lo; 4]).encode() <= SensorSample::new([hi; 4]).encode());
    }

    #[test]
    fn any_new_contact_value_raises_the_flag(repeats in 0usize..20, value in any::<bool>()) {
        let mut fit = FitStatus::new(PlayerId::Player1);
        fit.update_forehead_contact(i32::from(value));
        fit.clear_status_changed();
        for _ in 0..repeats {
            fit.update_forehead_contact(i32::from(value));
        }
        prop_assert!(!fit.status_changed());
        fit.update_forehead_contact(i32::from(!value));
        prop_assert!(fit.status_changed());
    }

    #[test]
    fn waiting_iff_not_both_fitted(p1 in any::<bool>(), p2 in any::<bool>()) {
        let mut s = SessionState::new();
        s.apply(PlayerId::Player1, SensorMessage::ForeheadContact(i32::from(p1)));
        s.apply(PlayerId::Player2, SensorMessage::ForeheadContact(i32::from(p2)));
        s.refresh_mode();
        prop_assert_eq!(s.waiting_for_headsets(), !(p1 && p2));
    }
}

#[test]
fn flag_lifecycle_from_construction() {
    let mut fit = FitStatus::new(PlayerId::Player2);
    assert!(fit.status_changed());
    let _ = fit.report();
    fit.clear_status_changed();
    assert!(!fit.status_changed());
}
