use crate::domain::entities::candidate::{columns, CandidateRecord};
use crate::domain::errors::SkipReason;

/// Optional gates on the screener's quarterly growth fields. A configured gate
/// rejects candidates whose value is missing or strictly below it.
#[derive(Debug, Clone, Default)]
pub struct FundamentalsScreen {
    pub min_qtr_sales_var_pct: Option<f64>,
    pub min_qtr_profit_var_pct: Option<f64>,
}

impl FundamentalsScreen {
    pub fn is_enabled(&self) -> bool {
        self.min_qtr_sales_var_pct.is_some() || self.min_qtr_profit_var_pct.is_some()
    }

    pub fn check(&self, record: &CandidateRecord) -> Result<(), SkipReason> {
        let gates = [
            (
                columns::QTR_SALES_VAR,
                self.min_qtr_sales_var_pct,
                record.qtr_sales_var_pct,
            ),
            (
                columns::QTR_PROFIT_VAR,
                self.min_qtr_profit_var_pct,
                record.qtr_profit_var_pct,
            ),
        ];

        for (field, minimum, value) in gates {
            if let Some(minimum) = minimum {
                match value {
                    Some(v) if v >= minimum => {}
                    _ => {
                        return Err(SkipReason::FundamentalsRejected {
                            field: field.to_string(),
                        })
                    }
                }
            }
        }
        Ok(())
    }
}
