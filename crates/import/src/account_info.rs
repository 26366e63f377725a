use sorter_core::AccountInfo;

use crate::util::re;

re!(re_account_no, r"(?i)Account\s*(?:No|Number)[:\s]+(\d+)");
re!(re_holder_name, r"(?i)(?:Mr\.|Mrs\.|Ms\.?)\s*([A-Z\s]+?)(?:\n|#|Address)");

/// Holder name and account number printed in a statement's header block.
/// Fields that cannot be found are left empty; the bank is never inferred.
pub fn extract_account_info(text: &str) -> AccountInfo {
    let account_no = re_account_no()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let name = re_holder_name()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    AccountInfo {
        name,
        bank: String::new(),
        account_no,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "STATE BANK OF INDIA\n\
                          Mr. RAJESH KUMAR\n\
                          Address 12 MG ROAD\n\
                          Account Number : 30012345678\n\
                          Post Date Value Date Details\n";

    #[test]
    fn extracts_name_and_number() {
        let info = extract_account_info(HEADER);
        assert_eq!(info.name, "RAJESH KUMAR");
        assert_eq!(info.account_no, "30012345678");
        assert!(info.bank.is_empty());
    }

    #[test]
    fn case_insensitive_labels() {
        let info = extract_account_info("account no:  998877\nMS ANITA #42");
        assert_eq!(info.account_no, "998877");
        assert_eq!(info.name, "ANITA");
    }

    #[test]
    fn missing_fields_are_empty() {
        let info = extract_account_info("01-04-2024 NEFT CR 10.00 20.00");
        assert_eq!(info, AccountInfo::new("", "", ""));
    }

    #[test]
    fn fills_from_defaults() {
        let info = extract_account_info(HEADER).or(AccountInfo::default());
        assert_eq!(info.bank, "SBI");
        assert_eq!(info.name, "RAJESH KUMAR");
    }
}
