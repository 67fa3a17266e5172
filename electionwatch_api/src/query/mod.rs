mod common;
pub use self::common::Query;

mod contest;
pub use self::contest::ContestQuery;

mod election;
pub use self::election::ElectionQuery;
