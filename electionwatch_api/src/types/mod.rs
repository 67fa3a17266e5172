mod envelope;
pub use self::envelope::PaginatedResponse;

mod contest;
pub use self::contest::{CandidateID, ContestFields, ContestID, RawNumber, RawResultRow, ResultFields};

mod election;
pub use self::election::Election;
