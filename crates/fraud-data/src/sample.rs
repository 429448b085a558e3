//! Built-in sample ledger.
//!
//! A small, fixed dataset used by the `sample` invocation mode so the
//! analysis can be demonstrated without uploading a file. It contains two
//! overlapping laundering loops sharing one account, a rapid pass-through
//! chain, and benign background transfers.

use eyre::Result;

use crate::ledger::{parse_ledger, ParsedLedger};

/// The sample ledger shipped with the engine.
///
/// Expected analysis outcome: two fraud rings (`ACC_101/102/103` and
/// `ACC_101/104/105`, sharing `ACC_101`), pass-through behavior on the
/// mule account `ACC_201`, and no findings for the `ACC_3xx` accounts.
pub const SAMPLE_LEDGER: &str = "\
source,target,amount,timestamp
ACC_101,ACC_102,5000.00,2024-03-01T08:00:00Z
ACC_102,ACC_103,4900.00,2024-03-06T09:30:00Z
ACC_103,ACC_101,4800.00,2024-03-11T10:15:00Z
ACC_101,ACC_104,7500.00,2024-03-12T10:00:00Z
ACC_104,ACC_105,7400.00,2024-03-16T16:45:00Z
ACC_105,ACC_101,7300.00,2024-03-20T11:20:00Z
ACC_200,ACC_201,12000.00,2024-03-05T09:00:00Z
ACC_201,ACC_202,11950.00,2024-03-05T15:30:00Z
ACC_300,ACC_301,250.75,2024-03-06T12:00:00Z
ACC_302,ACC_303,80.00,2024-03-10T18:00:00Z
ACC_301,ACC_304,60.25,2024-03-15T07:45:00Z
";

/// Parse the built-in sample ledger.
///
/// # Errors
/// Never fails in practice; the constant is well-formed by construction
/// and covered by tests.
pub fn sample_ledger() -> Result<ParsedLedger> {
    parse_ledger(SAMPLE_LEDGER.as_bytes())
}
