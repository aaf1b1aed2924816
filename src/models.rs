use std::collections::HashMap;

pub const FIELD_COUNT: usize = 21;

/// Header row written once when a store is created.
pub const HEADER: [&str; FIELD_COUNT] = [
    "Student ID",
    "Name",
    "Date of Birth",
    "Gender",
    "Date of Admission",
    "Standard",
    "Division",
    "Parents Mobile No.",
    "Parent Email ID",
    "Fee Payable",
    "Payment Date",
    "Payment Mode",
    "Transaction ID",
    "Fees per Installment",
    "Amount Paid",
    "Remaining Balance",
    "Category",
    "Due Date",
    "Installment",
    "Fees Status",
    "Remarks",
];

/// Form input names, in header order.
pub const FORM_FIELDS: [&str; FIELD_COUNT] = [
    "student_id",
    "student_name",
    "dob",
    "gender",
    "admission_date",
    "standard",
    "division",
    "parent_mobile",
    "parent_email",
    "fee_payable",
    "payment_date",
    "payment_mode",
    "transaction_id",
    "fees_per_installment",
    "amount_paid",
    "remaining_balance",
    "category",
    "due_date",
    "installment",
    "fees_status",
    "remarks",
];

const STUDENT_NAME: usize = 1;
const STANDARD: usize = 5;
const PARENT_MOBILE: usize = 7;
const AMOUNT_PAID: usize = 14;

/// One fee submission. Every field is kept as the text the form sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeRecord {
    fields: [String; FIELD_COUNT],
}

impl FeeRecord {
    #[allow(dead_code)]
    pub fn new(fields: [String; FIELD_COUNT]) -> Self {
        Self { fields }
    }

    /// Build a record from posted form values. Absent inputs become empty cells.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        Self {
            fields: FORM_FIELDS.map(|name| form.get(name).cloned().unwrap_or_default()),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn student_name(&self) -> &str {
        &self.fields[STUDENT_NAME]
    }

    pub fn standard(&self) -> &str {
        &self.fields[STANDARD]
    }

    pub fn parent_mobile(&self) -> &str {
        &self.fields[PARENT_MOBILE]
    }

    pub fn amount_paid(&self) -> &str {
        &self.fields[AMOUNT_PAID]
    }
}

/// Fields the guardian confirmation is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentNotice {
    pub student_name: String,
    pub standard: String,
    pub phone: String,
    pub amount: String,
}

impl From<&FeeRecord> for PaymentNotice {
    fn from(record: &FeeRecord) -> Self {
        Self {
            student_name: record.student_name().to_string(),
            standard: record.standard().to_string(),
            phone: record.parent_mobile().to_string(),
            amount: record.amount_paid().to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_fields() -> [String; FIELD_COUNT] {
    [
        "S1", "Asha Rao", "2010-05-01", "F", "2023-06-01", "5", "A", "9876543210", "p@x.com",
        "10000", "2024-01-05", "UPI", "TXN1", "2500", "2500", "7500", "General", "2024-02-01", "1",
        "Partial", "none",
    ]
    .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_bounds() {
        assert_eq!(HEADER.len(), 21);
        assert_eq!(HEADER[0], "Student ID");
        assert_eq!(HEADER[20], "Remarks");
    }

    #[test]
    fn test_from_form_missing_fields_are_empty() {
        let mut form = HashMap::new();
        form.insert("student_name".to_string(), "Asha Rao".to_string());
        form.insert("amount_paid".to_string(), "2500".to_string());
        let record = FeeRecord::from_form(&form);
        assert_eq!(record.fields().len(), FIELD_COUNT);
        assert_eq!(record.student_name(), "Asha Rao");
        assert_eq!(record.amount_paid(), "2500");
        assert_eq!(record.fields()[0], "");
        assert_eq!(record.fields()[20], "");
    }

    #[test]
    fn test_from_form_keeps_header_order() {
        let form: HashMap<String, String> = FORM_FIELDS
            .iter()
            .zip(sample_fields())
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let record = FeeRecord::from_form(&form);
        assert_eq!(record.fields(), &sample_fields());
    }

    #[test]
    fn test_payment_notice_fields() {
        let record = FeeRecord::new(sample_fields());
        let notice = PaymentNotice::from(&record);
        assert_eq!(notice.student_name, "Asha Rao");
        assert_eq!(notice.standard, "5");
        assert_eq!(notice.phone, "9876543210");
        assert_eq!(notice.amount, "2500");
    }
}
