//! Local tax-domain synonym expansion.
//!
//! Used when the assessment service cannot produce enough query variants.
//! E.g., "saas" → "software as a service", "digital automated service".

use std::collections::HashMap;
use std::sync::LazyLock;

/// Domain synonym map. Keys are lowercase single tokens.
static SYNONYMS: LazyLock<HashMap<&'static str, &'static [&'static str]>> = LazyLock::new(|| {
    let mut m: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
    m.insert(
        "saas",
        &[
            "software as a service",
            "digital automated service",
            "remotely accessed prewritten software",
        ],
    );
    m.insert("iaas", &["infrastructure as a service", "remote data storage"]);
    m.insert("paas", &["platform as a service", "digital automated service"]);
    m.insert("software", &["prewritten computer software", "digital product"]);
    m.insert("cloud", &["remotely accessed", "hosted service"]);
    m.insert("taxable", &["subject to retail sales tax", "retail sale"]);
    m.insert("exempt", &["exemption", "not subject to sales tax"]);
    m.insert("exemption", &["exempt", "excluded from retail sale"]);
    m.insert("b&o", &["business and occupation tax", "gross receipts tax"]);
    m.insert("digital", &["digital product", "digital good", "electronically delivered"]);
    m.insert("license", &["licensing", "right to use"]);
    m.insert("subscription", &["recurring access charge", "periodic service fee"]);
    m.insert("maintenance", &["software maintenance agreement", "support services"]);
    m.insert("resale", &["reseller permit", "purchase for resale"]);
    m.insert("shipping", &["delivery charges", "freight"]);
    m.insert("consulting", &["professional services", "advisory services"]);
    m.insert("hardware", &["tangible personal property", "equipment"]);
    m.insert("use", &["use tax", "consumer use"]);
    m
});

/// Generic domain rewrites used when no synonym applies.
const GENERIC_SUFFIXES: &[&str] = &[
    "retail sales tax treatment",
    "business and occupation tax classification",
    "use tax and exemptions",
    "statute and administrative rule",
];

/// Up to `count` local variants of `query`.
///
/// Each synonym substitution yields one variant; generic domain rewrites
/// fill any remaining slots. Variants never equal the original query.
pub fn local_variants(query: &str, count: usize) -> Vec<String> {
    let original = query.trim();
    let words: Vec<&str> = original.split_whitespace().collect();
    let mut out: Vec<String> = Vec::new();

    'outer: for (i, word) in words.iter().enumerate() {
        let token = normalize_token(word);
        let Some(synonyms) = SYNONYMS.get(token.as_str()) else {
            continue;
        };
        for synonym in *synonyms {
            let variant = substitute(&words, i, synonym);
            push_unique(&mut out, original, variant);
            if out.len() >= count {
                break 'outer;
            }
        }
    }

    for suffix in GENERIC_SUFFIXES {
        if out.len() >= count {
            break;
        }
        push_unique(&mut out, original, format!("{original} {suffix}"));
    }

    out.truncate(count);
    out
}

fn normalize_token(word: &str) -> String {
    word.trim_matches(|c: char| !c.is_alphanumeric() && c != '&')
        .to_lowercase()
}

fn substitute(words: &[&str], index: usize, replacement: &str) -> String {
    words
        .iter()
        .enumerate()
        .map(|(i, w)| if i == index { replacement } else { *w })
        .collect::<Vec<_>>()
        .join(" ")
}

fn push_unique(out: &mut Vec<String>, original: &str, variant: String) {
    if variant.eq_ignore_ascii_case(original) {
        return;
    }
    if out.iter().any(|v| v.eq_ignore_ascii_case(&variant)) {
        return;
    }
    out.push(variant);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_known_terms() {
        let variants = local_variants("Is SaaS taxable?", 3);
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0], "Is software as a service taxable?");
        assert!(variants.iter().all(|v| v != "Is SaaS taxable?"));
    }

    #[test]
    fn pads_with_generic_rewrites() {
        let variants = local_variants("widget purchase", 2);
        assert_eq!(variants.len(), 2);
        assert!(variants[0].starts_with("widget purchase "));
    }

    #[test]
    fn respects_count() {
        assert!(local_variants("saas iaas paas license", 0).is_empty());
        assert_eq!(local_variants("saas iaas paas license", 4).len(), 4);
    }

    #[test]
    fn handles_ampersand_token() {
        let variants = local_variants("B&O on consulting", 1);
        assert_eq!(variants, vec!["business and occupation tax on consulting".to_string()]);
    }
}
