//! German message texts. Only this module turns error codes into prose.

use chrono::NaiveDate;

use super::ErrorCode;

fn day(date: &NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

pub fn render(code: &ErrorCode, label: &str) -> String {
    match code {
        ErrorCode::Required => format!("{label} ist ein Pflichtfeld."),
        ErrorCode::PostalCodeShape => {
            format!("{label}: Die Postleitzahl muss aus fünf Ziffern bestehen.")
        }
        ErrorCode::PostalCodeRegion => {
            format!("{label}: Die Postleitzahl liegt außerhalb des Fördergebiets.")
        }
        ErrorCode::EmailShape => format!("{label}: Bitte geben Sie eine gültige E-Mail-Adresse an."),
        ErrorCode::TaxIdShape => {
            format!("{label}: Die Steuer-ID besteht aus elf Ziffern und beginnt nicht mit 0.")
        }
        ErrorCode::PhoneShape => format!("{label}: Bitte geben Sie eine gültige Telefonnummer an."),
        ErrorCode::AmountMalformed => format!("{label}: Der Betrag ist kein gültiger Eurobetrag."),
        ErrorCode::AmountNotPositive => format!("{label}: Der Betrag muss größer als 0 sein."),
        ErrorCode::NumberNotPositive => format!("{label}: Der Wert muss größer als 0 sein."),
        ErrorCode::DateMalformed => format!("{label}: Bitte geben Sie ein gültiges Datum an."),
        ErrorCode::AgeOutOfRange { earliest, latest } => format!(
            "{label}: Antragstellende müssen mindestens 18 und höchstens 120 Jahre alt sein (Geburtsdatum zwischen {} und {}).",
            day(earliest),
            day(latest)
        ),
        ErrorCode::DateOutOfRange { earliest, latest } => format!(
            "{label}: Das Datum muss zwischen dem {} und dem {} liegen.",
            day(earliest),
            day(latest)
        ),
        ErrorCode::YearOutOfRange { earliest, latest } => {
            format!("{label}: Das Jahr muss zwischen {earliest} und {latest} liegen.")
        }
        ErrorCode::PeriodicityNotAllowed => {
            format!("{label}: Dieser Zahlungsrhythmus ist für die Einkunftsart nicht zulässig.")
        }
        ErrorCode::ChangeDirectionMismatch {
            current,
            proposed,
            increase,
        } => {
            let (direction, relation) = if *increase {
                ("Erhöhung", "höher")
            } else {
                ("Verringerung", "niedriger")
            };
            format!(
                "{label}: Bei einer {direction} muss der neue Betrag ({}) {relation} sein als der bisherige ({}).",
                proposed.format_with_symbol(),
                current.format_with_symbol()
            )
        }
        ErrorCode::SelfHelpExceedsCost { self_help, cost } => format!(
            "{label}: Die Selbsthilfe ({}) darf die Kosten für Material und Lohn ({}) nicht übersteigen.",
            self_help.format_with_symbol(),
            cost.format_with_symbol()
        ),
        ErrorCode::HelperCategoryUncosted { category } => format!(
            "{label}: Für „{}“ ist in der Kostenaufstellung keine Selbsthilfe eingetragen.",
            category.label()
        ),
        ErrorCode::SelfHelpTotalMismatch { ledger, declared } => format!(
            "Die Summe der Selbsthilfe in der Kostenaufstellung ({}) stimmt nicht mit der Selbstauskunft ({}) überein.",
            ledger.format_with_symbol(),
            declared.format_with_symbol()
        ),
    }
}
