use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::calendar::MonthKey;
use super::money::AmountInput;

/// Complete application snapshot, one sub-tree per wizard step.
///
/// Snapshots are replaced wholesale; see [`super::change::RecordChange`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationRecord {
    pub personal: PersonalStep,
    pub income: Vec<IncomeDeclaration>,
    pub self_disclosure: SelfDisclosureStep,
    pub self_help: SelfHelpPlan,
}

impl ApplicationRecord {
    pub fn applicant(&self, row: usize) -> Option<&Person> {
        self.personal.applicants.get(row)
    }

    pub fn declaration_for(&self, person_id: &str) -> Option<&IncomeDeclaration> {
        self.income
            .iter()
            .find(|declaration| declaration.person_id == person_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalStep {
    pub applicants: Vec<Person>,
    /// Address of the subsidized object.
    pub object_address: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Person {
    pub id: String,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub nationality: String,
    pub birth_date: Option<NaiveDate>,
    pub tax_id: String,
    pub address: Address,
    pub contact: Contact,
    pub employment: Employment,
    pub is_applicant: bool,
    /// Stable link to a roster entry the row was copied from.
    pub original_person_id: Option<String>,
    pub role: Option<ApplicantRole>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicantRole {
    MainApplicant,
    CoApplicant,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: String,
    pub house_number: String,
    pub postal_code: String,
    pub city: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Employment {
    #[serde(rename = "type")]
    pub kind: Option<EmploymentType>,
    pub employer: String,
    pub contract_type: Option<ContractType>,
    pub employed_since: Option<NaiveDate>,
    pub contract_end: Option<NaiveDate>,
    pub business_description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentType {
    Employee,
    CivilServant,
    SoleTrader,
    BusinessOwner,
    Freelancer,
    Farmer,
    PrivateIncome,
    Pensioner,
    Unemployed,
    Student,
    Other,
}

impl EmploymentType {
    /// Wire names of the employment types that need a business description.
    pub const SELF_EMPLOYED: [&'static str; 5] = [
        "sole-trader",
        "business-owner",
        "freelancer",
        "farmer",
        "private-income",
    ];

    /// Wire names of the employment types backed by an employment contract.
    pub const CONTRACTED: [&'static str; 2] = ["employee", "civil-servant"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContractType {
    Permanent,
    FixedTerm,
}

/// Income declaration of one applicant row, linked through `person_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeDeclaration {
    pub person_id: String,
    pub has_employment_income: Option<bool>,
    pub window_anchor: Option<MonthKey>,
    pub monthly_income: BTreeMap<MonthKey, AmountInput>,
    pub special_payments: SpecialPayments,
    pub has_additional_income: Option<bool>,
    pub additional_income: Vec<IncomeEntry>,
    pub has_changes: Option<bool>,
    pub changes: Vec<ChangeEntry>,
}

impl IncomeDeclaration {
    pub fn entry_for(&self, category: IncomeCategory) -> Option<&IncomeEntry> {
        self.additional_income
            .iter()
            .find(|entry| entry.category == Some(category))
    }
}

/// One-off payments on top of the monthly salary ("Sonderzuwendungen").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpecialPayments {
    pub christmas_bonus: AmountInput,
    pub vacation_pay: AmountInput,
    pub other_bonus: AmountInput,
    pub other_bonus_description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncomeCategory {
    Pensions,
    Rental,
    Business,
    Agriculture,
    Other,
    TaxFreeSupport,
    TaxableSupport,
    ForeignIncome,
    FlatTaxedWages,
    UnemploymentBenefit,
}

impl IncomeCategory {
    pub const fn ordered() -> [Self; 10] {
        [
            Self::Pensions,
            Self::Rental,
            Self::Business,
            Self::Agriculture,
            Self::Other,
            Self::TaxFreeSupport,
            Self::TaxableSupport,
            Self::ForeignIncome,
            Self::FlatTaxedWages,
            Self::UnemploymentBenefit,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pensions => "Renten",
            Self::Rental => "Vermietung und Verpachtung",
            Self::Business => "Gewerbebetrieb und selbstständige Arbeit",
            Self::Agriculture => "Land- und Forstwirtschaft",
            Self::Other => "Sonstige Einkünfte",
            Self::TaxFreeSupport => "Steuerfreie Unterhaltsleistungen",
            Self::TaxableSupport => "Steuerpflichtige Unterhaltsleistungen",
            Self::ForeignIncome => "Ausländische Einkünfte",
            Self::FlatTaxedWages => "Pauschal versteuerter Arbeitslohn",
            Self::UnemploymentBenefit => "Arbeitslosengeld",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Periodicity {
    Monthly,
    Yearly,
}

impl Periodicity {
    pub const fn from_monthly_flag(monthly: bool) -> Self {
        if monthly {
            Self::Monthly
        } else {
            Self::Yearly
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeEntry {
    pub category: Option<IncomeCategory>,
    pub amount: AmountInput,
    pub periodicity: Option<Periodicity>,
    /// Assessment year for yearly figures.
    pub year: Option<i32>,
    pub extra_fields: BTreeMap<String, String>,
}

/// What a planned income change refers to: the salary table or one income category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    Employment,
    Pensions,
    Rental,
    Business,
    Agriculture,
    Other,
    TaxFreeSupport,
    TaxableSupport,
    ForeignIncome,
    FlatTaxedWages,
    UnemploymentBenefit,
}

impl ChangeKind {
    pub const fn category(self) -> Option<IncomeCategory> {
        match self {
            Self::Employment => None,
            Self::Pensions => Some(IncomeCategory::Pensions),
            Self::Rental => Some(IncomeCategory::Rental),
            Self::Business => Some(IncomeCategory::Business),
            Self::Agriculture => Some(IncomeCategory::Agriculture),
            Self::Other => Some(IncomeCategory::Other),
            Self::TaxFreeSupport => Some(IncomeCategory::TaxFreeSupport),
            Self::TaxableSupport => Some(IncomeCategory::TaxableSupport),
            Self::ForeignIncome => Some(IncomeCategory::ForeignIncome),
            Self::FlatTaxedWages => Some(IncomeCategory::FlatTaxedWages),
            Self::UnemploymentBenefit => Some(IncomeCategory::UnemploymentBenefit),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangeEntry {
    #[serde(rename = "type")]
    pub kind: Option<ChangeKind>,
    pub date: Option<NaiveDate>,
    pub new_amount: AmountInput,
    pub increase: Option<bool>,
    pub is_new_income_monthly: Option<bool>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelfDisclosureStep {
    /// Self-help value declared in the financing overview.
    pub self_help_total: AmountInput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelfHelpPlan {
    pub ledger: Vec<CostLedgerEntry>,
    pub helpers: Vec<Helper>,
}

/// Construction trades a cost row can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerCategory {
    Earthwork,
    Masonry,
    Carpentry,
    Roofing,
    Plastering,
    Drywall,
    Flooring,
    Tiling,
    Painting,
    Electrical,
    Plumbing,
    Heating,
    Windows,
    Landscaping,
    Other,
}

impl LedgerCategory {
    /// Wire names of categories whose description the applicant writes.
    pub const FREE_TEXT: [&'static str; 1] = ["other"];

    pub const fn is_free_text(self) -> bool {
        matches!(self, Self::Other)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Earthwork => "Erdarbeiten",
            Self::Masonry => "Maurerarbeiten",
            Self::Carpentry => "Zimmererarbeiten",
            Self::Roofing => "Dachdeckerarbeiten",
            Self::Plastering => "Putzarbeiten",
            Self::Drywall => "Trockenbau",
            Self::Flooring => "Estrich- und Bodenbelagsarbeiten",
            Self::Tiling => "Fliesenarbeiten",
            Self::Painting => "Malerarbeiten",
            Self::Electrical => "Elektroinstallation",
            Self::Plumbing => "Sanitärinstallation",
            Self::Heating => "Heizungsinstallation",
            Self::Windows => "Fenster und Türen",
            Self::Landscaping => "Außenanlagen",
            Self::Other => "Sonstige Arbeiten",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostLedgerEntry {
    pub category: Option<LedgerCategory>,
    pub description: String,
    pub material: AmountInput,
    pub labor: AmountInput,
    pub self_help: AmountInput,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Helper {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub job_categories: BTreeSet<LedgerCategory>,
    pub hours: Option<u32>,
    pub email: String,
    pub address: Address,
}
