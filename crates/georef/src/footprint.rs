//! WKT footprints: `POLYGON((x y, ...))` or `MULTIPOLYGON(((x y, ...)), ...)`.
//! Only exterior and interior ring coordinates matter here; the envelope is
//! all that is used downstream.

use geo::BoundingRect;
use geo_types::{Coord, LineString, MultiPolygon, Polygon, Rect};

use crate::error::{GeorefError, Result};

/// Image footprint as parsed from WKT.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub geometry: MultiPolygon<f64>,
}

impl Footprint {
    pub fn parse(wkt: &str) -> Result<Self> {
        let wkt = wkt.trim();

        let polygons = if let Some(body) = strip_keyword(wkt, "MULTIPOLYGON") {
            split_groups(strip_parens(body)?)?
                .into_iter()
                .map(parse_polygon_body)
                .collect::<Result<Vec<_>>>()?
        } else if let Some(body) = strip_keyword(wkt, "POLYGON") {
            vec![parse_polygon_body(body)?]
        } else {
            return Err(GeorefError::InvalidWkt(
                "expected POLYGON or MULTIPOLYGON".to_string(),
            ));
        };

        Ok(Self {
            geometry: MultiPolygon::new(polygons),
        })
    }

    pub fn envelope(&self) -> Result<Rect<f64>> {
        self.geometry
            .bounding_rect()
            .ok_or_else(|| GeorefError::InvalidWkt("footprint has no coordinates".to_string()))
    }

    /// Envelope corners in order upper-left, upper-right, lower-right,
    /// lower-left (north up).
    pub fn corners(&self) -> Result<[Coord<f64>; 4]> {
        let envelope = self.envelope()?;
        let (min, max) = (envelope.min(), envelope.max());
        Ok([
            Coord { x: min.x, y: max.y },
            Coord { x: max.x, y: max.y },
            Coord { x: max.x, y: min.y },
            Coord { x: min.x, y: min.y },
        ])
    }
}

fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    s.get(..keyword.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(keyword))
        .map(|_| &s[keyword.len()..])
}

/// `"( ... )"` → `" ... "`, requiring balanced outer parentheses.
fn strip_parens(s: &str) -> Result<&str> {
    let s = s.trim();
    s.strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| GeorefError::InvalidWkt(format!("expected parenthesised group, got '{s}'")))
}

/// Splits `"(a), (b), (c)"` at top-level commas.
fn split_groups(s: &str) -> Result<Vec<&str>> {
    let mut groups = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, ch) in s.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(GeorefError::InvalidWkt("unbalanced parentheses".to_string()));
                }
            }
            ',' if depth == 0 => {
                groups.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(GeorefError::InvalidWkt("unbalanced parentheses".to_string()));
    }
    groups.push(s[start..].trim());
    Ok(groups)
}

fn parse_polygon_body(body: &str) -> Result<Polygon<f64>> {
    let mut rings = split_groups(strip_parens(body)?)?
        .into_iter()
        .map(|ring| parse_ring(strip_parens(ring)?))
        .collect::<Result<Vec<_>>>()?
        .into_iter();

    let exterior = rings
        .next()
        .ok_or_else(|| GeorefError::InvalidWkt("polygon has no rings".to_string()))?;
    Ok(Polygon::new(exterior, rings.collect()))
}

fn parse_ring(coords: &str) -> Result<LineString<f64>> {
    let points = coords
        .split(',')
        .map(|pair| {
            let pair = pair.trim();
            let parts: Vec<&str> = pair.split_whitespace().collect();
            // extra ordinates (Z, M) are ignored
            let (Some(&x), Some(&y)) = (parts.first(), parts.get(1)) else {
                return Err(GeorefError::InvalidWkt(format!(
                    "expected 'x y' coordinate, got '{pair}'"
                )));
            };
            let parse = |value: &str| {
                value
                    .parse::<f64>()
                    .map_err(|_| GeorefError::InvalidWkt(format!("invalid coordinate '{value}'")))
            };
            Ok(Coord {
                x: parse(x)?,
                y: parse(y)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if points.len() < 3 {
        return Err(GeorefError::InvalidWkt(format!(
            "ring needs at least 3 coordinates, got {}",
            points.len()
        )));
    }
    Ok(LineString::new(points))
}
