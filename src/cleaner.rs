use itertools::Itertools;

/// 清洗字符串列表：去除首尾空白、丢弃空串、去重（保留首次出现的顺序，大小写不变）
pub fn filtered_list<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .unique()
        .collect()
}

/// 清洗原始文本：去掉除换行、制表符以外的控制字符和零宽字符
pub fn filtered_str(text: &str) -> String {
    text.chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .filter(|c| !matches!(c, '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_empties_and_duplicates() {
        let list = filtered_list(vec![" a.com ", "", "b.com", "a.com", "   "]);
        assert_eq!(list, vec!["a.com".to_string(), "b.com".to_string()]);
    }

    #[test]
    fn case_is_preserved() {
        let list = filtered_list(["WWW.a.com", "www.a.com"]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn strips_control_noise() {
        let text = "\u{feff}example.com\r\n10.0.0.1\u{0}";
        assert_eq!(filtered_str(text), "example.com\n10.0.0.1");
    }
}
