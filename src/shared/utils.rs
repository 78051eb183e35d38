pub mod date_util;
pub mod validation;
