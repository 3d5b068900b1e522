use loom_ir::{Expr, Interval, ModulusRemainder, Scope, Type};
use proptest::prelude::*;

fn interval_and_member() -> impl Strategy<Value = (Interval, i64)> {
    (-1000i64..1000, 0i64..500, 0i64..500).prop_map(|(lo, width, off)| {
        let off = off.min(width);
        (Interval::bounded(lo, lo + width), lo + off)
    })
}

fn congruence_and_member() -> impl Strategy<Value = (ModulusRemainder, i64)> {
    (1i64..16, 0i64..16, -50i64..50).prop_map(|(m, r, k)| {
        let fact = ModulusRemainder::new(m, r);
        (fact, m * k + r)
    })
}

proptest! {
    #[test]
    fn interval_arithmetic_contains_results((a, x) in interval_and_member(), (b, y) in interval_and_member()) {
        prop_assert!(a.add(&b).contains(x + y));
        prop_assert!(a.sub(&b).contains(x - y));
        prop_assert!(a.mul(&b).contains(x * y));
        prop_assert!(a.min_with(&b).contains(x.min(y)));
        prop_assert!(a.max_with(&b).contains(x.max(y)));
        prop_assert!(a.union(&b).contains(x));
    }

    #[test]
    fn interval_division_contains_results((a, x) in interval_and_member(), c in prop_oneof![-9i64..-1, 1i64..9]) {
        prop_assert!(a.div_by_const(c).contains(x.div_euclid(c)));
        prop_assert!(a.mod_by_const(c).contains(x.rem_euclid(c)));
    }

    #[test]
    fn congruences_are_sound((f, x) in congruence_and_member(), (g, y) in congruence_and_member()) {
        let holds = |fact: ModulusRemainder, v: i64| match fact.as_exact() {
            Some(e) => e == v,
            None => (v - fact.remainder).rem_euclid(fact.modulus) == 0,
        };
        prop_assert!(holds(f.add(&g), x + y));
        prop_assert!(holds(f.sub(&g), x - y));
        prop_assert!(holds(f.mul(&g), x * y));
        prop_assert!(holds(f.unify(&g), x) && holds(f.unify(&g), y));
        prop_assert!(holds(f.mod_by(6), x.rem_euclid(6)));
    }

    #[test]
    fn scope_pops_mirror_pushes(names in proptest::collection::vec("[a-c]", 1..20)) {
        let mut scope = Scope::new();
        for (i, n) in names.iter().enumerate() {
            scope.push(n.clone(), i);
        }
        for (i, n) in names.iter().enumerate().rev() {
            prop_assert_eq!(scope.get(n), Some(&i));
            prop_assert_eq!(scope.pop(), Some((n.clone(), i)));
        }
        prop_assert!(scope.is_empty());
    }
}

#[test]
fn trees_load_from_json() {
    let text = r#"{"Binary":{"op":"Add","a":{"Var":{"name":"x","ty":{"code":"Int","bits":32,"lanes":1}}},"b":{"IntImm":{"ty":{"code":"Int","bits":32,"lanes":1},"value":3}}}}"#;
    let e: Expr = serde_json::from_str(text).unwrap();
    assert_eq!(e, Expr::add(Expr::var("x"), Expr::int(3)));
    assert_eq!(e.ty(), Type::i32());

    let call = r#"{"Call":{"name":"f","args":[],"ty":{"code":"Int","bits":32,"lanes":1}}}"#;
    let c: Expr = serde_json::from_str(call).unwrap();
    assert_eq!(c, Expr::call("f", vec![], Type::i32()));
}
