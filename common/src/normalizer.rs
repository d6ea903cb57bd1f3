// Phone number normalization into gateway recipient identifiers

use crate::errors::InvalidNumberError;
use crate::models::CandidateIdentifier;

/// Country code prepended to every identifier
pub const COUNTRY_PREFIX: &str = "55";

/// Mobile prefix inserted into the alternate form of a 10-digit number
const TEN_DIGIT_MOBILE_PREFIX: &str = "959";

/// Mobile prefix inserted into the alternate form of an 11-digit number
const ELEVEN_DIGIT_MOBILE_PREFIX: &str = "95";

/// Turn a raw contact number into a `[primary, alternate]` identifier pair.
///
/// Every non-ASCII-digit character is dropped first. Ten digits keep the
/// number after the two-digit area code behind `55959`; eleven digits keep the
/// number after the first three digits behind `5595`. Any other length is
/// rejected.
pub fn normalize(raw: &str) -> Result<[CandidateIdentifier; 2], InvalidNumberError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    let alternate = match digits.len() {
        10 => format!("{COUNTRY_PREFIX}{TEN_DIGIT_MOBILE_PREFIX}{}", &digits[2..]),
        11 => format!("{COUNTRY_PREFIX}{ELEVEN_DIGIT_MOBILE_PREFIX}{}", &digits[3..]),
        digit_count => {
            tracing::warn!(raw_number = %raw, digit_count, "The number is invalid");
            return Err(InvalidNumberError {
                raw: raw.to_string(),
                digit_count,
            });
        }
    };

    let primary = format!("{COUNTRY_PREFIX}{digits}");

    Ok([
        CandidateIdentifier::new(primary),
        CandidateIdentifier::new(alternate),
    ])
}
