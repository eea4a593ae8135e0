pub mod domain;
pub mod envelope;
pub mod ports;
pub mod profile;
pub mod registration;
pub mod session;
pub mod validation;

pub use domain::{Certification, Education, Endpoint, Method, RegisterStep1Data, User};
pub use envelope::{ApiResponse, FieldErrors, OperationResult};
pub use ports::{BackendGateway, BackendReply, BackendRequest, PortError, PortResult, RelayCall, RelayReply, RelayService};
pub use profile::{PersonalInfo, ProfileDraft};
pub use registration::{FlowError, RegistrationFlow, RegistrationState};
pub use session::{Operation, SessionError, SessionStore};
