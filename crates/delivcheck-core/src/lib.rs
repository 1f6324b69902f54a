pub mod address;
pub mod codes;
pub mod config;
pub mod filter;
pub mod record;
pub mod result;
pub mod status;

pub use address::{Address, AddressId, Order, OrderId, VerificationRequest};
pub use codes::{CodeSeverity, Verdict, classify, describe};
pub use config::{ActionOrder, AnalysisTrigger, EngineConfig};
pub use filter::filter_codes;
pub use record::{AddressBlock, AddressSubtype, BulkReceiver, DeliveryPoint, PersonBlock, VerificationRecord};
pub use result::AnalysisResult;
pub use status::{OrderAnalysisStatus, ParseStatusError};
