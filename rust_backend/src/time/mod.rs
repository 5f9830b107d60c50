pub mod civil;

pub use civil::{
    format_hhmm, hours_after_utc_midnight, local_date, parse_reference_timestamp, to_local,
    utc_midnight,
};
