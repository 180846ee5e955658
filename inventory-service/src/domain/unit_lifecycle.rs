//! Unit status transition guard.
//!
//! Every unit status mutation routes through `guard_unit_transition`; the
//! persistence layer additionally re-checks the expected status with a
//! conditional update so concurrent writers lose cleanly.

use crate::domain::DomainError;
use crate::models::UnitStatus;

impl UnitStatus {
    /// Legal lifecycle moves:
    ///
    ///   in_stock -> sold      (transaction payment completion)
    ///   sold     -> refund    (refund creation)
    ///   sold     -> rma       (RMA approval, warranty valid)
    ///   rma      -> replace   (RMA completed with "Replace" resolution)
    ///   rma      -> sold      (RMA completed with any other resolution)
    pub fn can_transition(self, to: UnitStatus) -> bool {
        matches!(
            (self, to),
            (UnitStatus::InStock, UnitStatus::Sold)
                | (UnitStatus::Sold, UnitStatus::Refund)
                | (UnitStatus::Sold, UnitStatus::Rma)
                | (UnitStatus::Rma, UnitStatus::Replace)
                | (UnitStatus::Rma, UnitStatus::Sold)
        )
    }
}

/// Validate a requested transition for one unit.
pub fn guard_unit_transition(
    serial: &str,
    from: UnitStatus,
    to: UnitStatus,
) -> Result<(), DomainError> {
    if from.can_transition(to) {
        Ok(())
    } else {
        Err(DomainError::InvalidUnitTransition {
            serial: serial.to_string(),
            from,
            to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [UnitStatus; 5] = [
        UnitStatus::InStock,
        UnitStatus::Sold,
        UnitStatus::Refund,
        UnitStatus::Rma,
        UnitStatus::Replace,
    ];

    #[test]
    fn legal_transitions_pass_the_guard() {
        for (from, to) in [
            (UnitStatus::InStock, UnitStatus::Sold),
            (UnitStatus::Sold, UnitStatus::Refund),
            (UnitStatus::Sold, UnitStatus::Rma),
            (UnitStatus::Rma, UnitStatus::Replace),
            (UnitStatus::Rma, UnitStatus::Sold),
        ] {
            assert!(guard_unit_transition("SN-1", from, to).is_ok());
        }
    }

    #[test]
    fn direct_refund_from_stock_is_rejected() {
        let err = guard_unit_transition("SN-1", UnitStatus::InStock, UnitStatus::Refund)
            .expect_err("in_stock -> refund must be illegal");
        match err {
            DomainError::InvalidUnitTransition { serial, from, to } => {
                assert_eq!(serial, "SN-1");
                assert_eq!(from, UnitStatus::InStock);
                assert_eq!(to, UnitStatus::Refund);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn everything_not_in_the_table_is_rejected() {
        let legal = [
            (UnitStatus::InStock, UnitStatus::Sold),
            (UnitStatus::Sold, UnitStatus::Refund),
            (UnitStatus::Sold, UnitStatus::Rma),
            (UnitStatus::Rma, UnitStatus::Replace),
            (UnitStatus::Rma, UnitStatus::Sold),
        ];
        for from in ALL {
            for to in ALL {
                let expected = legal.contains(&(from, to));
                assert_eq!(
                    guard_unit_transition("SN-1", from, to).is_ok(),
                    expected,
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn sell_then_refund_succeeds_stepwise() {
        assert!(guard_unit_transition("SN-1", UnitStatus::InStock, UnitStatus::Sold).is_ok());
        assert!(guard_unit_transition("SN-1", UnitStatus::Sold, UnitStatus::Refund).is_ok());
    }
}
