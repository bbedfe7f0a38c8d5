//! Head-rotation and gaze log ingestion
//!
//! Logs are line-delimited text with semicolon-separated fields and
//! parenthesized numeric tuples, always using '.' as decimal separator:
//!
//! ```text
//! startingTimestamp;12.5;
//! InitialRotationQuaternion;(0,0,0,1);            (head logs only)
//! timestamp;EulerRotationXYZ;QuaternionRot;forwardXYZ;UV_range01[;Confidence]
//! 0.011;(1.2,350.1,0);(0.01,-0.07,0,0.99);(-0.15,-0.02,0.98);(0.47,0.51);[0.97;]
//! ```

pub mod format;
pub mod parser;

pub use parser::{LogParser, ParsedLog};
