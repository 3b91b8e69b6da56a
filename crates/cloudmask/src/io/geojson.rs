use std::path::Path;

use geo_types::Polygon;
use geojson::{feature::Id, Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Number, Value as JsonValue};

use crate::{error::Result, pipeline::DetectionResult};

fn ring_coordinates(polygon: &Polygon<f64>) -> Vec<Vec<Vec<f64>>> {
    vec![polygon
        .exterior()
        .coords()
        .map(|c| vec![c.x, c.y])
        .collect()]
}

fn number(value: f64) -> JsonValue {
    Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or(JsonValue::Null)
}

impl DetectionResult {
    /// One Polygon feature per cloud, with sequential ids from 0.
    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .geometry
            .multipolygon
            .0
            .iter()
            .zip(&self.geometry.pixel_areas)
            .enumerate()
            .map(|(i, (polygon, &area))| {
                let mut properties = Map::new();
                properties.insert("id".to_string(), JsonValue::from(i));
                properties.insert("area".to_string(), number(area));
                // ring length without the closing vertex
                properties.insert(
                    "vertex_count".to_string(),
                    JsonValue::from(polygon.exterior().0.len().saturating_sub(1)),
                );

                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Polygon(ring_coordinates(polygon)))),
                    id: Some(Id::Number(Number::from(i))),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        let mut foreign_members = Map::new();
        foreign_members.insert("image_width".to_string(), JsonValue::from(self.image_width));
        foreign_members.insert("image_height".to_string(), JsonValue::from(self.image_height));
        foreign_members.insert("cloud_count".to_string(), JsonValue::from(self.cloud_count()));

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        }
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_geojson())?)
    }

    /// Save GeoJSON to file
    pub fn save_geojson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::DetectionConfig, geo_transform::GeoTransform, pipeline::Pipeline,
        types::RasterImage,
    };
    use geojson::{FeatureCollection, Value};
    use image::{GrayImage, Luma};

    fn detect(blocks: &[(u32, u32, u32)]) -> crate::pipeline::DetectionResult {
        let mut image = GrayImage::new(40, 30);
        for &(x0, y0, side) in blocks {
            for y in y0..y0 + side {
                for x in x0..x0 + side {
                    image.put_pixel(x, y, Luma([255]));
                }
            }
        }
        let config = DetectionConfig {
            denoise_kernel_size: 3,
            selection_percentage: 1.0,
            ..Default::default()
        };
        Pipeline::from_config(&config)
            .expect("Should build pipeline")
            .process(
                &RasterImage::from_gray(&image).expect("valid raster"),
                &GeoTransform::north_up(1000.0, 2000.0, 10.0, -10.0).expect("valid transform"),
            )
            .expect("Should process")
    }

    #[test]
    fn features_carry_sequential_ids() {
        let collection = detect(&[(2, 2, 6), (20, 10, 8)]).to_geojson();
        assert_eq!(collection.features.len(), 2);
        for (i, feature) in collection.features.iter().enumerate() {
            assert_eq!(feature.property("id").and_then(|v| v.as_u64()), Some(i as u64));
            assert!(matches!(
                feature.geometry.as_ref().map(|g| &g.value),
                Some(Value::Polygon(_))
            ));
        }
        let members = collection.foreign_members.expect("Should have metadata");
        assert_eq!(members["cloud_count"], 2);
        assert_eq!(members["image_width"], 40);
    }

    #[test]
    fn rings_are_closed_world_coordinates() {
        let collection = detect(&[(2, 2, 6)]).to_geojson();
        let Some(Value::Polygon(rings)) = collection.features[0].geometry.as_ref().map(|g| &g.value)
        else {
            panic!("expected a polygon");
        };
        let ring = &rings[0];
        assert_eq!(ring.first(), ring.last());
        assert!(ring.iter().all(|p| (1000.0..=1400.0).contains(&p[0])));
        assert!(ring.iter().all(|p| (1700.0..=2000.0).contains(&p[1])));
    }

    #[test]
    fn empty_result_round_trips_as_text() {
        let text = detect(&[]).to_geojson_string().expect("Should serialize");
        let parsed: FeatureCollection = text.parse().expect("Should parse");
        assert!(parsed.features.is_empty());
    }

    #[test]
    fn saves_to_disk() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("clouds.geojson");
        detect(&[(5, 5, 10)]).save_geojson(&path).expect("Should save");
        let parsed: FeatureCollection = std::fs::read_to_string(&path)
            .expect("Should read")
            .parse()
            .expect("Should parse");
        assert_eq!(parsed.features.len(), 1);
    }
}
