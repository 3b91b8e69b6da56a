//! ESRI world files: six lines `A D B E C F`, where `C`/`F` locate the
//! centre of the upper-left pixel.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    error::{CloudMaskError, Result},
    geo_transform::GeoTransform,
};

pub fn parse_world_file(content: &str) -> Result<GeoTransform> {
    let values: Vec<f64> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.parse::<f64>()
                .map_err(|_| CloudMaskError::load(format!("invalid world file value '{line}'")))
        })
        .collect::<Result<_>>()?;

    let &[a, d, b, e, c, f] = values.as_slice() else {
        return Err(CloudMaskError::load(format!(
            "world file needs 6 values, got {}",
            values.len()
        )));
    };

    GeoTransform::from_gdal([c - a / 2.0 - b / 2.0, a, b, f - d / 2.0 - e / 2.0, d, e])
}

pub fn format_world_file(transform: &GeoTransform) -> String {
    let [x0, a, b, y0, d, e] = transform.coefficients();
    let c = x0 + a / 2.0 + b / 2.0;
    let f = y0 + d / 2.0 + e / 2.0;
    format!("{a}\n{d}\n{b}\n{e}\n{c}\n{f}\n")
}

pub fn read_world_file<P: AsRef<Path>>(path: P) -> Result<GeoTransform> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .map_err(|err| CloudMaskError::load(format!("cannot read {}: {err}", path.display())))?;
    parse_world_file(&content)
}

pub fn write_world_file<P: AsRef<Path>>(path: P, transform: &GeoTransform) -> Result<()> {
    fs::write(path, format_world_file(transform))?;
    Ok(())
}

/// Sidecar names tried for an image, most specific first: `scene.tfw`,
/// `scene.tifw`, `scene.wld`.
pub fn world_file_candidates(image_path: &Path) -> Vec<PathBuf> {
    let Some(ext) = image_path.extension().and_then(|e| e.to_str()) else {
        return vec![image_path.with_extension("wld")];
    };

    let mut candidates = Vec::with_capacity(3);
    let mut chars = ext.chars();
    if let (Some(first), Some(last)) = (chars.next(), chars.next_back()) {
        candidates.push(image_path.with_extension(format!("{first}{last}w")));
    }
    candidates.push(image_path.with_extension(format!("{ext}w")));
    candidates.push(image_path.with_extension("wld"));
    candidates
}

pub fn find_world_file(image_path: &Path) -> Option<PathBuf> {
    world_file_candidates(image_path)
        .into_iter()
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_file_is_centre_referenced() {
        let gt = parse_world_file("2\n0\n0\n-2\n101\n199\n").expect("Should parse");
        assert_eq!(gt.coefficients(), [100.0, 2.0, 0.0, 200.0, 0.0, -2.0]);
    }

    #[test]
    fn format_inverts_parse() {
        let gt = GeoTransform::from_gdal([440720.0, 60.0, 0.5, 3751320.0, -0.5, -60.0])
            .expect("valid transform");
        assert_eq!(parse_world_file(&format_world_file(&gt)).expect("Should parse"), gt);
    }

    #[test]
    fn rejects_short_or_malformed_files() {
        assert!(parse_world_file("1\n0\n0\n-1\n0\n").is_err());
        assert!(parse_world_file("1\n0\n0\n-1\n0\nnorth\n").is_err());
    }

    #[test]
    fn candidate_names_follow_convention() {
        let names: Vec<String> = world_file_candidates(Path::new("/data/scene.png"))
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(String::from))
            .collect();
        assert_eq!(names, ["scene.pgw", "scene.pngw", "scene.wld"]);
    }

    #[test]
    fn finds_an_existing_sidecar() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let image = dir.path().join("scene.tif");
        assert!(find_world_file(&image).is_none());

        let gt = GeoTransform::north_up(10.0, 20.0, 1.0, -1.0).expect("valid transform");
        write_world_file(dir.path().join("scene.wld"), &gt).expect("Should write");
        let found = find_world_file(&image).expect("Should find sidecar");
        assert_eq!(read_world_file(found).expect("Should read"), gt);
    }
}
