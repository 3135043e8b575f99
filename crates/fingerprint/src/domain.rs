//! Domain-name helpers for fingerprint matching

/// Strip exactly one trailing root-zone dot.
#[inline]
pub fn trim_root(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Label immediately left of the public-suffix boundary.
///
/// `shop.example.co.uk.` -> `example`. Returns `None` when the name is itself a
/// public suffix or has no registrable part.
///
/// Private suffixes count as public suffixes, so on hosting platforms the label
/// is the customer's own: `foo.herokuapp.com` -> `foo`, not `herokuapp`. A
/// customer label that equals a service key (`github.herokuapp.com`) yields a
/// service match when no direct pattern hit first.
pub fn second_level_label(name: &str) -> Option<String> {
    let name = trim_root(name.trim()).to_ascii_lowercase();
    let registrable = psl::domain_str(&name)?;
    let suffix = psl::suffix_str(registrable)?;
    let label = registrable.strip_suffix(suffix)?.strip_suffix('.')?;
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

/// Normalize a service id into a lookup key: lowercase ASCII alphanumerics.
pub fn service_key(service_id: &str) -> String {
    service_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_a_single_root_dot() {
        assert_eq!(trim_root("shop.myshopify.com."), "shop.myshopify.com");
        assert_eq!(trim_root("shop.myshopify.com.."), "shop.myshopify.com.");
        assert_eq!(trim_root("shop.myshopify.com"), "shop.myshopify.com");
    }

    #[test]
    fn second_level_of_icann_names() {
        assert_eq!(second_level_label("x.randomhost.net").as_deref(), Some("randomhost"));
        assert_eq!(second_level_label("a.b.example.co.uk.").as_deref(), Some("example"));
        assert_eq!(second_level_label("Mixed.Example.COM").as_deref(), Some("example"));
    }

    #[test]
    fn private_suffix_yields_customer_label() {
        assert_eq!(second_level_label("foo.herokuapp.com.").as_deref(), Some("foo"));
        assert_eq!(second_level_label("shop.myshopify.com").as_deref(), Some("shop"));
        assert_eq!(second_level_label("herokuapp.com"), None);
    }

    #[test]
    fn bare_suffix_has_no_label() {
        assert_eq!(second_level_label("com"), None);
        assert_eq!(second_level_label("co.uk."), None);
        assert_eq!(second_level_label(""), None);
    }

    #[test]
    fn service_keys_are_normalized() {
        assert_eq!(service_key("Amazon S3"), "amazons3");
        assert_eq!(service_key("GitHub Pages"), "githubpages");
        assert_eq!(service_key("heroku"), "heroku");
    }
}
