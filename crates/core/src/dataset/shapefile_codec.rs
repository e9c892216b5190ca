//! Shapefile codec.
//!
//! Attributes become string columns; the geometry arrives as a WKT
//! column named `geometry`. Stored output is a zip of the shapefile
//! sidecar set, mirroring how shapefile results are delivered.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use geo::Geometry;
use shapefile::dbase::{self, FieldValue};
use shapefile::Shape;
use wkt::{ToWkt, Wkt};

use super::{Dataset, DatasetCodec, DatasetError};

/// Name of the synthesized WKT column.
pub const GEOMETRY_COLUMN: &str = "geometry";

/// DBF attribute names are limited to 10 bytes.
const DBF_NAME_MAX: usize = 10;
const DBF_FIELD_WIDTH_MAX: usize = 254;

pub struct ShapefileCodec;

impl ShapefileCodec {
    pub fn new() -> Self {
        Self
    }

    /// Locates the `.shp` file under an extracted upload root.
    fn find_shp(root: &Path) -> Result<PathBuf, DatasetError> {
        if root.is_file() {
            return Ok(root.to_path_buf());
        }

        let mut candidates: Vec<PathBuf> = std::fs::read_dir(root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("shp"))
            })
            .collect();
        candidates.sort();

        candidates.into_iter().next().ok_or_else(|| {
            DatasetError::Read(format!("no .shp file found under {}", root.display()))
        })
    }
}

impl Default for ShapefileCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetCodec for ShapefileCodec {
    fn read(&self, path: &Path) -> Result<Dataset, DatasetError> {
        let shp_path = Self::find_shp(path)?;

        let dbf_path = shp_path.with_extension("dbf");
        let dbase_reader = dbase::Reader::from_path(&dbf_path)
            .map_err(|e| DatasetError::Read(format!("failed to open dbf: {e}")))?;
        let field_names: Vec<String> = dbase_reader
            .fields()
            .iter()
            .map(|f| f.name().to_string())
            .filter(|name| name != "DeletionFlags")
            .collect();

        let pairs = shapefile::read(&shp_path)
            .map_err(|e| DatasetError::Read(format!("failed to read shapefile: {e}")))?;

        let mut columns = vec![GEOMETRY_COLUMN.to_string()];
        columns.extend(field_names.iter().cloned());

        let mut rows = Vec::with_capacity(pairs.len());
        for (shape, record) in pairs {
            let mut row = Vec::with_capacity(columns.len());
            row.push(shape_to_wkt(shape));
            for name in &field_names {
                row.push(
                    record
                        .get(name)
                        .map(field_value_to_string)
                        .unwrap_or_default(),
                );
            }
            rows.push(row);
        }

        Dataset::new(columns, rows)
    }

    fn write(&self, dataset: &Dataset, dir: &Path, stem: &str) -> Result<PathBuf, DatasetError> {
        let geometry_idx = dataset.column_index(GEOMETRY_COLUMN).ok_or_else(|| {
            DatasetError::Write(format!("dataset has no {GEOMETRY_COLUMN} column"))
        })?;

        let output_dir = dir.join(stem);
        std::fs::create_dir_all(&output_dir)?;
        let shp_path = output_dir.join(format!("{stem}.shp"));

        let attribute_columns: Vec<(usize, String)> = dataset
            .columns()
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != geometry_idx)
            .map(|(idx, name)| (idx, name.clone()))
            .collect();
        let dbf_names = dbf_field_names(&attribute_columns);

        let mut builder = dbase::TableWriterBuilder::new();
        for ((idx, name), dbf_name) in attribute_columns.iter().zip(&dbf_names) {
            let width = dataset
                .rows()
                .iter()
                .map(|row| row[*idx].len())
                .max()
                .unwrap_or(1)
                .clamp(1, DBF_FIELD_WIDTH_MAX) as u8;
            let field_name = dbase::FieldName::try_from(dbf_name.as_str()).map_err(|e| {
                DatasetError::Write(format!("invalid attribute name {name}: {e:?}"))
            })?;
            builder = builder.add_character_field(field_name, width);
        }

        let mut writer = shapefile::Writer::from_path(&shp_path, builder)
            .map_err(|e| DatasetError::Write(format!("failed to create shapefile: {e}")))?;

        for row in dataset.rows() {
            let geometry = parse_wkt(&row[geometry_idx])?;

            let mut record = dbase::Record::default();
            for ((idx, _), dbf_name) in attribute_columns.iter().zip(&dbf_names) {
                record.insert(
                    dbf_name.clone(),
                    FieldValue::Character(Some(row[*idx].clone())),
                );
            }

            write_geometry(&mut writer, geometry, &record)?;
        }
        drop(writer);

        let zip_path = dir.join(format!("{stem}.zip"));
        zip_directory(&output_dir, &zip_path)?;
        Ok(zip_path)
    }

    fn output_extension(&self) -> &'static str {
        "zip"
    }
}

fn shape_to_wkt(shape: Shape) -> String {
    match Geometry::<f64>::try_from(shape) {
        Ok(geometry) => geometry.wkt_string(),
        Err(_) => String::new(),
    }
}

fn parse_wkt(value: &str) -> Result<Geometry<f64>, DatasetError> {
    let parsed: Wkt<f64> = value
        .parse()
        .map_err(|e| DatasetError::Write(format!("invalid WKT value: {e:?}")))?;
    Geometry::try_from(parsed)
        .map_err(|e| DatasetError::Write(format!("invalid WKT value: {e:?}")))
}

fn field_value_to_string(value: &FieldValue) -> String {
    match value {
        FieldValue::Character(Some(s)) => s.clone(),
        FieldValue::Character(None) => String::new(),
        FieldValue::Numeric(Some(n)) => n.to_string(),
        FieldValue::Numeric(None) => String::new(),
        FieldValue::Float(Some(f)) => f.to_string(),
        FieldValue::Float(None) => String::new(),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Logical(Some(b)) => b.to_string(),
        FieldValue::Logical(None) => String::new(),
        FieldValue::Date(Some(d)) => {
            format!("{:04}-{:02}-{:02}", d.year(), d.month(), d.day())
        }
        FieldValue::Date(None) => String::new(),
        other => format!("{other:?}"),
    }
}

fn write_geometry<T: std::io::Write + std::io::Seek>(
    writer: &mut shapefile::Writer<T>,
    geometry: Geometry<f64>,
    record: &dbase::Record,
) -> Result<(), DatasetError> {
    let bad_shape = |e: &dyn std::fmt::Debug| {
        DatasetError::Write(format!("geometry not representable as a shape: {e:?}"))
    };
    let map_err = |e: shapefile::Error| DatasetError::Write(format!("failed to write shape: {e}"));

    match geometry {
        Geometry::Point(point) => {
            let shape = shapefile::Point::try_from(point).map_err(|e| bad_shape(&e))?;
            writer.write_shape_and_record(&shape, record).map_err(map_err)
        }
        Geometry::MultiPoint(points) => {
            let shape = shapefile::Multipoint::try_from(points).map_err(|e| bad_shape(&e))?;
            writer.write_shape_and_record(&shape, record).map_err(map_err)
        }
        Geometry::LineString(line) => {
            let lines = geo::MultiLineString::new(vec![line]);
            let shape = shapefile::Polyline::try_from(lines).map_err(|e| bad_shape(&e))?;
            writer.write_shape_and_record(&shape, record).map_err(map_err)
        }
        Geometry::MultiLineString(lines) => {
            let shape = shapefile::Polyline::try_from(lines).map_err(|e| bad_shape(&e))?;
            writer.write_shape_and_record(&shape, record).map_err(map_err)
        }
        Geometry::Polygon(polygon) => {
            let polygons = geo::MultiPolygon::new(vec![polygon]);
            let shape = shapefile::Polygon::try_from(polygons).map_err(|e| bad_shape(&e))?;
            writer.write_shape_and_record(&shape, record).map_err(map_err)
        }
        Geometry::MultiPolygon(polygons) => {
            let shape = shapefile::Polygon::try_from(polygons).map_err(|e| bad_shape(&e))?;
            writer.write_shape_and_record(&shape, record).map_err(map_err)
        }
        other => Err(DatasetError::Write(format!(
            "unsupported geometry type: {}",
            other.wkt_string()
        ))),
    }
}

/// Truncates attribute names to the DBF limit, keeping them unique.
fn dbf_field_names(columns: &[(usize, String)]) -> Vec<String> {
    let mut names = Vec::with_capacity(columns.len());
    for (_, name) in columns {
        let mut candidate: String = name.chars().take(DBF_NAME_MAX).collect();
        let mut cnt = 1usize;
        while names.contains(&candidate) {
            let suffix = cnt.to_string();
            let keep = DBF_NAME_MAX.saturating_sub(suffix.len());
            candidate = format!("{}{}", name.chars().take(keep).collect::<String>(), suffix);
            cnt += 1;
        }
        names.push(candidate);
    }
    names
}

fn zip_directory(src_dir: &Path, zip_path: &Path) -> Result<(), DatasetError> {
    let file = std::fs::File::create(zip_path)?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default();

    let mut entries: Vec<PathBuf> = std::fs::read_dir(src_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    for path in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        writer
            .start_file(name, options)
            .map_err(|e| DatasetError::Write(format!("failed to zip output: {e}")))?;
        let content = std::fs::read(&path)?;
        writer
            .write_all(&content)
            .map_err(|e| DatasetError::Write(format!("failed to zip output: {e}")))?;
    }

    writer
        .finish()
        .map_err(|e| DatasetError::Write(format!("failed to zip output: {e}")))?;
    Ok(())
}
