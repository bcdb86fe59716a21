//! Registration form: private/company fields, password eyes, and the
//! latest allowed birthdate.

use crate::Result;
use crate::page::Page;
use crate::scripts::{Handler, password};

const MS_PER_DAY: i64 = 86_400_000;
const MINIMUM_AGE_YEARS: i64 = 18;

pub(crate) fn boot(page: &mut Page) -> Result<()> {
    if let Some(kind_select) = page.dom.by_id("kind-select") {
        page.add_listener(kind_select, "change", Handler::UpdateKindFields);
        update_kind_fields(page)?;
    }

    password::setup_eye(page, "password")?;
    password::setup_eye(page, "password2")?;

    if let Some(birthdate) = page.dom.by_id("birthdate") {
        let max = latest_birthdate(page.now_ms());
        page.dom.set_attr(birthdate, "max", &max)?;
    }
    Ok(())
}

/// Shows the birthdate group for private customers and the company group
/// for everyone else.
pub(crate) fn update_kind_fields(page: &mut Page) -> Result<()> {
    let (Some(kind_select), Some(birth_group), Some(company_group)) = (
        page.dom.by_id("kind-select"),
        page.dom.by_id("birthdate-group"),
        page.dom.by_id("company-group"),
    ) else {
        return Ok(());
    };

    let (birth_display, company_display) = if page.dom.value(kind_select)? == "private" {
        ("block", "none")
    } else {
        ("none", "block")
    };
    page.dom.style_set(birth_group, "display", birth_display)?;
    page.dom.style_set(company_group, "display", company_display)?;
    Ok(())
}

/// `YYYY-MM-DD` for the UTC date of `now_ms` with the year moved back by the
/// minimum age. Month and day are kept as they are.
pub fn latest_birthdate(now_ms: i64) -> String {
    let (year, month, day) = civil_from_days(now_ms.div_euclid(MS_PER_DAY));
    format!("{}-{month:02}-{day:02}", year - MINIMUM_AGE_YEARS)
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month as u32, day as u32)
}
