mod calculation_result;
mod filing_status;
mod form_code;
mod line_item;
mod phase_out;
mod rule_set;
mod tax_bracket;
mod taxpayer_input;

pub use calculation_result::{CalculationResponse, CalculationResult, ExplainStep, SourceValue, Warning};
pub use filing_status::FilingStatusCode;
pub use form_code::{FormCode, normalize_form_code};
pub use line_item::{LineItem, Rounding};
pub use phase_out::PhaseOut;
pub use rule_set::{RoundingMode, RuleSetBuilder, RuleSetKey, TaxYearRuleSet};
pub use tax_bracket::TaxBracket;
pub use taxpayer_input::{InputKind, InputValue, TaxpayerInput};
