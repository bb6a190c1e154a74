//! City name to 51job region code (`jobarea`) lookup.

use itertools::Itertools;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Region code meaning "all of China".
pub const NATIONWIDE_CODE: &str = "000000";

/// Label used in file names when no city filter is given.
pub const NATIONWIDE_LABEL: &str = "全国";

static CITY_CODES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("北京", "010000"),
        ("上海", "020000"),
        ("广州", "030200"),
        ("深圳", "040000"),
        ("天津", "050000"),
        ("重庆", "060000"),
        ("南京", "070200"),
        ("苏州", "070300"),
        ("无锡", "070400"),
        ("杭州", "080200"),
        ("宁波", "080300"),
        ("成都", "090200"),
        ("福州", "110200"),
        ("厦门", "110300"),
        ("济南", "120200"),
        ("青岛", "120300"),
        ("长春", "240200"),
        ("哈尔滨", "220200"),
        ("合肥", "150200"),
        ("石家庄", "160200"),
        ("郑州", "170200"),
        ("武汉", "180200"),
        ("长沙", "190200"),
        ("西安", "200200"),
        ("太原", "210200"),
        ("沈阳", "230200"),
        ("大连", "230300"),
        ("昆明", "250200"),
        ("贵阳", "260200"),
        ("南宁", "140200"),
        ("南昌", "130200"),
        ("兰州", "270200"),
        ("海口", "100200"),
        ("东莞", "030800"),
        ("佛山", "030600"),
        ("珠海", "030500"),
        ("香港", "330000"),
    ])
});

/// Look up a single city. Surrounding whitespace is ignored.
pub fn code_for(city: &str) -> Option<&'static str> {
    CITY_CODES.get(city.trim()).copied()
}

/// Resolve city names to one region code usable in the search query.
///
/// An empty list means nationwide. Known cities are joined with `,`, which
/// the site accepts as a multi-area filter. Unknown names are dropped; when
/// none of the names is known the result is `None` and the caller decides
/// what to fall back to.
pub fn resolve<S: AsRef<str>>(city_names: &[S]) -> Option<String> {
    if city_names.is_empty() {
        return Some(NATIONWIDE_CODE.to_string());
    }

    let mut codes = Vec::with_capacity(city_names.len());
    for name in city_names {
        match code_for(name.as_ref()) {
            Some(code) => codes.push(code),
            None => warn!(city = name.as_ref(), "Unknown city; dropping from filter"),
        }
    }

    if codes.is_empty() {
        return None;
    }
    let joined = codes.into_iter().unique().join(",");
    debug!(region_code = %joined, "Resolved region code");
    Some(joined)
}

/// Split a free-form city argument into names.
///
/// Accepts `,` `，` `、` and `&` as separators; a blank string yields no
/// cities, i.e. nationwide.
pub fn split_city_arg(raw: &str) -> Vec<String> {
    raw.split([',', '，', '、', '&'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// The label a dataset file carries for a set of cities.
pub fn city_label<S: AsRef<str>>(city_names: &[S]) -> String {
    match city_names {
        [] => NATIONWIDE_LABEL.to_string(),
        [one] => one.as_ref().to_string(),
        many => many.iter().map(|c| c.as_ref()).join("&"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_single_city() {
        assert_eq!(resolve(&["深圳"]), Some("040000".to_string()));
        assert_eq!(resolve(&[" 北京 "]), Some("010000".to_string()));
    }

    #[test]
    fn test_resolve_empty_is_nationwide() {
        let none: [&str; 0] = [];
        assert_eq!(resolve(&none), Some(NATIONWIDE_CODE.to_string()));
    }

    #[test]
    fn test_resolve_unknown_city_is_none() {
        assert_eq!(resolve(&["亚特兰蒂斯"]), None);
        assert_eq!(resolve(&["Springfield", "Gotham"]), None);
    }

    #[test]
    fn test_resolve_many_cities_joins_known_codes() {
        assert_eq!(
            resolve(&["深圳", "未知城", "武汉"]),
            Some("040000,180200".to_string())
        );
        assert_eq!(resolve(&["深圳", "深圳"]), Some("040000".to_string()));
    }

    #[test]
    fn test_split_city_arg() {
        assert_eq!(split_city_arg("深圳"), vec!["深圳"]);
        assert_eq!(split_city_arg("深圳, 北京、上海&广州，杭州"), vec!["深圳", "北京", "上海", "广州", "杭州"]);
        assert!(split_city_arg("  ").is_empty());
    }

    #[test]
    fn test_city_label() {
        let none: [&str; 0] = [];
        assert_eq!(city_label(&none), "全国");
        assert_eq!(city_label(&["深圳"]), "深圳");
        assert_eq!(city_label(&["深圳", "武汉"]), "深圳&武汉");
    }
}
