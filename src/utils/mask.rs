/// Mask a key code for listing views. Keys are only shown in full through the
/// audited reveal endpoint. The last four characters stay visible so an admin
/// can tell keys apart; separators are preserved.
pub fn mask_key_code(code: &str) -> String {
    let visible = 4usize;
    let total = code.chars().count();

    if total <= visible {
        return "•".repeat(total.max(1));
    }

    code.chars()
        .enumerate()
        .map(|(i, c)| {
            if c == '-' || i >= total - visible {
                c
            } else {
                '•'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_keeps_last_four_and_separators() {
        assert_eq!(mask_key_code("AAAAA-BBBBB-CCCCC"), "•••••-•••••-•CCCC");
        assert_eq!(mask_key_code("ABCDEFGH"), "••••EFGH");
    }

    #[test]
    fn test_mask_short_codes_fully() {
        assert_eq!(mask_key_code("ABCD"), "••••");
        assert_eq!(mask_key_code(""), "•");
    }
}
