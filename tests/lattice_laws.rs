use absint_rs::expr::Variable;
use absint_rs::interval::{Bound, Interval};
use absint_rs::lattice::Lattice;
use absint_rs::numerical::NumericalDomain;
use absint_rs::octagon::Octagon;
use proptest::prelude::*;

fn bound() -> impl Strategy<Value = Option<i64>> {
    prop_oneof![1 => Just(None), 4 => (-20i64..20).prop_map(Some)]
}

fn interval() -> impl Strategy<Value = Interval> {
    prop_oneof![
        1 => Just(Interval::empty()),
        8 => (bound(), bound()).prop_map(|(lo, hi)| {
            let lower = lo.map_or(Bound::NegInf, Bound::finite);
            let upper = hi.map_or(Bound::PosInf, Bound::finite);
            Interval::new(lower, upper)
        }),
    ]
}

/// Octagons over `x` and `y` built from bounds on `x`, `y` and `x - y`.
fn octagon() -> impl Strategy<Value = Octagon> {
    (interval(), interval(), bound()).prop_map(|(x, y, diff)| {
        let (vx, vy) = (Variable::new("x"), Variable::new("y"));
        let mut octagon = Octagon::new([vx.clone(), vy.clone()]);
        octagon.set_bounds(&vx, &x);
        octagon.set_bounds(&vy, &y);
        if let Some(d) = diff {
            octagon.add_difference_upper_bound(&vx, &vy, &d.into());
        }
        octagon
    })
}

proptest! {
    #[test]
    fn interval_join_is_upper_bound(a in interval(), b in interval()) {
        let j = a.clone().join(b.clone());
        prop_assert!(a.less_equal(&j));
        prop_assert!(b.less_equal(&j));
    }

    #[test]
    fn interval_meet_is_lower_bound(a in interval(), b in interval()) {
        let m = a.clone().meet(b.clone());
        prop_assert!(m.less_equal(&a));
        prop_assert!(m.less_equal(&b));
    }

    #[test]
    fn interval_widening_is_upper_bound(a in interval(), b in interval()) {
        let w = a.clone().widening(b.clone());
        prop_assert!(a.less_equal(&w));
        prop_assert!(b.less_equal(&w));
    }

    #[test]
    fn interval_contains_members_of_join(a in interval(), b in interval(), v in -30i64..30) {
        let j = a.clone().join(b.clone());
        if a.contains(&v.into()) || b.contains(&v.into()) {
            prop_assert!(j.contains(&v.into()));
        }
    }

    #[test]
    fn octagon_join_is_upper_bound(a in octagon(), b in octagon()) {
        let j = a.clone().join(b.clone());
        prop_assert!(a.less_equal(&j));
        prop_assert!(b.less_equal(&j));
    }

    #[test]
    fn octagon_meet_is_lower_bound(a in octagon(), b in octagon()) {
        let m = a.clone().meet(b.clone());
        prop_assert!(m.less_equal(&a));
        prop_assert!(m.less_equal(&b));
    }

    #[test]
    fn octagon_widening_is_upper_bound(a in octagon(), b in octagon()) {
        let w = a.clone().widening(b.clone());
        prop_assert!(a.less_equal(&w));
        prop_assert!(b.less_equal(&w));
    }

    #[test]
    fn octagon_bounds_agree_with_intervals(x in interval(), y in interval()) {
        let (vx, vy) = (Variable::new("x"), Variable::new("y"));
        let mut octagon = Octagon::new([vx.clone(), vy.clone()]);
        octagon.set_bounds(&vx, &x);
        octagon.set_bounds(&vy, &y);
        if x.is_empty() || y.is_empty() {
            prop_assert!(octagon.is_bottom());
        } else {
            prop_assert_eq!(octagon.bounds(&vx), x);
            prop_assert_eq!(octagon.bounds(&vy), y);
        }
    }
}
