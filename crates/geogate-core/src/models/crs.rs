//! Coordinate reference system descriptors.
//!
//! A [`Crs`] identifies the reference system a dataset is expressed in and
//! whether its axes use linear (projected) or angular (geographic) units.
//! geogate never reprojects; descriptors are only compared and inspected.

use crate::error::{GeogateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit family of a coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrsKind {
    /// Linear units (metres, feet) on a projected plane
    Projected,
    /// Angular units (degrees of latitude/longitude)
    Geographic,
}

impl CrsKind {
    /// Infer the unit family from an EPSG code.
    ///
    /// EPSG reserves 4000-4999 for geographic 2D systems; everything else that
    /// reaches a vector dataset is treated as projected.
    pub fn from_epsg(code: u32) -> Self {
        if (4000..=4999).contains(&code) {
            CrsKind::Geographic
        } else {
            CrsKind::Projected
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsKind::Geographic)
    }
}

impl fmt::Display for CrsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrsKind::Projected => write!(f, "projected"),
            CrsKind::Geographic => write!(f, "geographic"),
        }
    }
}

/// Coordinate Reference System descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: Option<u32>,
    pub name: String,
    pub kind: CrsKind,
}

impl Crs {
    pub fn new(epsg: Option<u32>, name: impl Into<String>, kind: CrsKind) -> Self {
        Self {
            epsg,
            name: name.into(),
            kind,
        }
    }

    /// Descriptor for an EPSG code, with the unit family inferred from the code
    pub fn from_epsg(code: u32) -> Self {
        let name = match code {
            4326 => "WGS 84".to_string(),
            4269 => "NAD83".to_string(),
            4258 => "ETRS89".to_string(),
            3857 => "WGS 84 / Pseudo-Mercator".to_string(),
            32601..=32660 => format!("WGS 84 / UTM zone {}N", code - 32600),
            32701..=32760 => format!("WGS 84 / UTM zone {}S", code - 32700),
            _ => format!("EPSG:{}", code),
        };
        Self::new(Some(code), name, CrsKind::from_epsg(code))
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Parse a descriptor from WKT (e.g. the contents of a Shapefile `.prj`).
    ///
    /// Returns `None` when the text is not a recognisable CRS definition.
    pub fn from_wkt(wkt: &str) -> Option<Self> {
        let trimmed = wkt.trim();
        let open = trimmed.find('[')?;
        let keyword = trimmed[..open].trim().to_ascii_uppercase();

        let kind = match keyword.as_str() {
            "GEOGCS" | "GEOGCRS" | "GEODCRS" | "GEOGRAPHICCRS" => CrsKind::Geographic,
            "PROJCS" | "PROJCRS" | "PROJECTEDCRS" => CrsKind::Projected,
            _ => return None,
        };

        let name = quoted_after(trimmed, open).unwrap_or_else(|| "unnamed".to_string());
        let epsg = root_authority_code(trimmed).or_else(|| esri_name_code(&name, kind));

        Some(Self::new(epsg, name, kind))
    }

    /// Human-readable identifier such as `EPSG:32649` or the WKT name
    pub fn identifier(&self) -> String {
        match self.epsg {
            Some(code) => format!("EPSG:{}", code),
            None => self.name.clone(),
        }
    }

    pub fn is_geographic(&self) -> bool {
        self.kind.is_geographic()
    }

    /// Check whether two descriptors denote the same reference system.
    ///
    /// EPSG codes are authoritative when both sides carry one; otherwise the
    /// normalised names must agree. The unit family must always agree.
    pub fn same_as(&self, other: &Crs) -> bool {
        if self.kind != other.kind {
            return false;
        }
        match (self.epsg, other.epsg) {
            (Some(a), Some(b)) => a == b,
            _ => normalize_name(&self.name) == normalize_name(&other.name),
        }
    }
}

impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Crs {}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.epsg {
            Some(code) => write!(f, "EPSG:{} ({}, {})", code, self.name, self.kind),
            None => write!(f, "{} ({})", self.name, self.kind),
        }
    }
}

impl FromStr for Crs {
    type Err = GeogateError;

    /// Accepts `EPSG:32649`, `32649`, `urn:ogc:def:crs:EPSG::32649` and the
    /// OGC `CRS84` aliases. WKT definitions are accepted as well.
    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim();
        if value.is_empty() {
            return Err(GeogateError::InvalidCrs {
                value: s.to_string(),
                reason: "empty CRS string".to_string(),
            });
        }

        if value.contains('[') {
            return Crs::from_wkt(value).ok_or_else(|| GeogateError::InvalidCrs {
                value: s.to_string(),
                reason: "unrecognised WKT root keyword".to_string(),
            });
        }

        let upper = value.to_ascii_uppercase();
        if upper == "CRS84" || upper.ends_with(":CRS84") {
            return Ok(Crs::wgs84());
        }

        // "EPSG:4326", "urn:ogc:def:crs:EPSG::4326" and bare "4326" all end in the code
        let code_str = upper.rsplit(':').next().unwrap_or(&upper);
        if !upper.contains("EPSG") && upper.contains(':') {
            return Err(GeogateError::InvalidCrs {
                value: s.to_string(),
                reason: "only EPSG and OGC CRS84 identifiers are supported".to_string(),
            });
        }

        code_str
            .parse::<u32>()
            .map(Crs::from_epsg)
            .map_err(|_| GeogateError::InvalidCrs {
                value: s.to_string(),
                reason: "expected an EPSG code such as EPSG:32649".to_string(),
            })
    }
}

fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// First double-quoted string after `from`
fn quoted_after(text: &str, from: usize) -> Option<String> {
    let rest = &text[from..];
    let start = rest.find('"')? + 1;
    let len = rest[start..].find('"')?;
    Some(rest[start..start + len].to_string())
}

/// EPSG code attached to the root of a WKT definition.
///
/// Nested datum and spheroid nodes carry their own authority codes; the root
/// code is the last one in the text.
fn root_authority_code(wkt: &str) -> Option<u32> {
    let upper = wkt.to_ascii_uppercase();
    let patterns = ["AUTHORITY[\"EPSG\",\"", "ID[\"EPSG\","];

    patterns
        .iter()
        .filter_map(|p| upper.rfind(p).map(|pos| (pos, pos + p.len())))
        .max_by_key(|(pos, _)| *pos)
        .and_then(|(_, code_start)| {
            let digits: String = upper[code_start..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        })
}

/// EPSG code for the ESRI names QGIS and ArcGIS write into `.prj` files
/// that carry no authority node. The code must agree with the WKT root kind.
fn esri_name_code(name: &str, kind: CrsKind) -> Option<u32> {
    let upper = name.trim().to_ascii_uppercase();
    let code = match upper.as_str() {
        "GCS_WGS_1984" => 4326,
        "GCS_NORTH_AMERICAN_1983" => 4269,
        "GCS_ETRS_1989" => 4258,
        "WGS_1984_WEB_MERCATOR_AUXILIARY_SPHERE" => 3857,
        _ => utm_zone_code(&upper)?,
    };

    (CrsKind::from_epsg(code) == kind).then_some(code)
}

/// `WGS_1984_UTM_ZONE_49N` -> 32649, `WGS_1984_UTM_ZONE_7S` -> 32707
fn utm_zone_code(upper: &str) -> Option<u32> {
    let zone = upper.strip_prefix("WGS_1984_UTM_ZONE_")?;
    let (number, base) = match (zone.strip_suffix('N'), zone.strip_suffix('S')) {
        (Some(number), _) => (number, 32600),
        (None, Some(number)) => (number, 32700),
        (None, None) => return None,
    };
    let number: u32 = number.parse().ok().filter(|n| (1..=60).contains(n))?;
    Some(base + number)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UTM_49N_PRJ: &str = r#"PROJCS["WGS_1984_UTM_Zone_49N",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],UNIT["Meter",1.0],AUTHORITY["EPSG","32649"]]"#;

    #[test]
    fn test_kind_from_epsg() {
        assert_eq!(CrsKind::from_epsg(4326), CrsKind::Geographic);
        assert_eq!(CrsKind::from_epsg(4269), CrsKind::Geographic);
        assert_eq!(CrsKind::from_epsg(3857), CrsKind::Projected);
        assert_eq!(CrsKind::from_epsg(32649), CrsKind::Projected);
    }

    #[test]
    fn test_parse_identifiers() {
        assert_eq!("EPSG:32649".parse::<Crs>().unwrap().epsg, Some(32649));
        assert_eq!("32649".parse::<Crs>().unwrap().epsg, Some(32649));
        let urn: Crs = "urn:ogc:def:crs:EPSG::3857".parse().unwrap();
        assert_eq!(urn.epsg, Some(3857));

        let crs84 = "urn:ogc:def:crs:OGC:1.3:CRS84".parse::<Crs>().unwrap();
        assert_eq!(crs84.epsg, Some(4326));
        assert!(crs84.is_geographic());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Crs>().is_err());
        assert!("EPSG:abc".parse::<Crs>().is_err());
        assert!("ESRI:102100".parse::<Crs>().is_err());
    }

    #[test]
    fn test_from_wkt_uses_root_authority() {
        let crs = Crs::from_wkt(UTM_49N_PRJ).unwrap();
        assert_eq!(crs.epsg, Some(32649));
        assert_eq!(crs.kind, CrsKind::Projected);
        assert_eq!(crs.name, "WGS_1984_UTM_Zone_49N");
    }

    #[test]
    fn test_from_wkt_without_authority() {
        let wkt = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
        let crs = Crs::from_wkt(wkt).unwrap();
        assert_eq!(crs.epsg, Some(4326));
        assert!(crs.is_geographic());
        assert_eq!(crs, Crs::wgs84());

        let local = r#"PROJCS["Local_Grid",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]]],PROJECTION["Transverse_Mercator"],UNIT["Meter",1.0]]"#;
        let crs = Crs::from_wkt(local).unwrap();
        assert_eq!(crs.epsg, None);
        assert_eq!(crs.identifier(), "Local_Grid");
    }

    #[test]
    fn test_esri_utm_prj_matches_epsg() {
        let wkt = r#"PROJCS["WGS_1984_UTM_Zone_49N",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",111.0],PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],UNIT["Meter",1.0]]"#;
        let crs = Crs::from_wkt(wkt).unwrap();

        assert_eq!(crs.epsg, Some(32649));
        assert!(crs.same_as(&Crs::from_epsg(32649)));
        assert!(!crs.same_as(&Crs::from_epsg(32749)));
    }

    #[test]
    fn test_esri_names() {
        let projected = [
            ("WGS_1984_UTM_Zone_49N", Some(32649)),
            ("WGS_1984_UTM_Zone_7S", Some(32707)),
            ("WGS_1984_UTM_Zone_61N", None),
            ("WGS_1984_UTM_Zone_49X", None),
            ("WGS_1984_Web_Mercator_Auxiliary_Sphere", Some(3857)),
            ("Local_Grid", None),
            ("GCS_WGS_1984", None),
        ];
        for (name, expected) in projected {
            assert_eq!(esri_name_code(name, CrsKind::Projected), expected, "{name}");
        }

        let geographic = esri_name_code("GCS_WGS_1984", CrsKind::Geographic);
        assert_eq!(geographic, Some(4326));
    }

    #[test]
    fn test_from_wkt_rejects_non_crs() {
        assert!(Crs::from_wkt("POINT (1 2)").is_none());
        assert!(Crs::from_wkt("not wkt").is_none());
    }

    #[test]
    fn test_equality_by_code_then_name() {
        assert_eq!(Crs::from_epsg(32649), Crs::from_epsg(32649));
        assert_ne!(Crs::from_epsg(32649), Crs::from_epsg(32650));
        assert_ne!(Crs::from_epsg(4326), Crs::from_epsg(3857));

        let a = Crs::new(None, "WGS_1984_UTM_Zone_49N", CrsKind::Projected);
        let b = Crs::new(None, "wgs 1984 utm zone 49n", CrsKind::Projected);
        assert_eq!(a, b);

        let c = Crs::new(None, "WGS_1984_UTM_Zone_49N", CrsKind::Geographic);
        assert_ne!(a, c);
    }
}
