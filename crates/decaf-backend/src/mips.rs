use crate::alloc::{Constraints, RegisterInfo};

/// The MIPS register file as seen by the allocator. `$s7` is kept back for
/// `this`; the rest of the saved and temporary registers are general purpose.
pub const CONSTRAINTS: Constraints = Constraints {
    #[rustfmt::skip]
    registers: &[
        RegisterInfo { id: 8, name: "$t0" },
        RegisterInfo { id: 9, name: "$t1" },
        RegisterInfo { id: 10, name: "$t2" },
        RegisterInfo { id: 11, name: "$t3" },
        RegisterInfo { id: 12, name: "$t4" },
        RegisterInfo { id: 13, name: "$t5" },
        RegisterInfo { id: 14, name: "$t6" },
        RegisterInfo { id: 15, name: "$t7" },
        RegisterInfo { id: 24, name: "$t8" },
        RegisterInfo { id: 25, name: "$t9" },
        RegisterInfo { id: 16, name: "$s0" },
        RegisterInfo { id: 17, name: "$s1" },
        RegisterInfo { id: 18, name: "$s2" },
        RegisterInfo { id: 19, name: "$s3" },
        RegisterInfo { id: 20, name: "$s4" },
        RegisterInfo { id: 21, name: "$s5" },
        RegisterInfo { id: 22, name: "$s6" },
    ],
    receiver: RegisterInfo { id: 23, name: "$s7" },
    budget: None,
};

#[cfg(test)]
mod tests {
    use super::CONSTRAINTS;
    use decaf_common::tac::Register;

    #[test]
    fn receiver_is_not_in_the_pool() {
        let pool = CONSTRAINTS.pool();
        assert_eq!(17, pool.len());
        assert!(!pool.contains(&CONSTRAINTS.receiver()));
        assert_eq!(Register(8), pool[0]);
    }

    #[test]
    fn budget_truncates_the_pool() {
        let constraints = CONSTRAINTS.with_budget(3);
        assert_eq!(
            vec![Register(8), Register(9), Register(10)],
            constraints.pool()
        );

        assert_eq!(17, CONSTRAINTS.with_budget(40).pool().len());
        assert_eq!(Some(&"$s7"), CONSTRAINTS.register_names().get(&Register(23)));
    }
}
