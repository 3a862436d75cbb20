//! Selection types collected by the cost-calculator wizard.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KitchenShape {
    #[serde(rename = "straight")]
    Straight,
    L,
    U,
}

impl KitchenShape {
    /// Number of wall measurements this layout needs.
    #[must_use]
    pub fn required_walls(self) -> usize {
        match self {
            KitchenShape::Straight => 1,
            KitchenShape::L => 2,
            KitchenShape::U => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            KitchenShape::Straight => "straight",
            KitchenShape::L => "L",
            KitchenShape::U => "U",
        }
    }
}

impl std::fmt::Display for KitchenShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KitchenShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "straight" | "I" | "i" => Ok(KitchenShape::Straight),
            "L" | "l" => Ok(KitchenShape::L),
            "U" | "u" => Ok(KitchenShape::U),
            other => Err(format!(
                "kitchen shape must be 'straight', 'L' or 'U', got '{other}'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Hdf,
    Plywood,
    Acrylic,
}

impl Material {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Material::Hdf => "hdf",
            Material::Plywood => "plywood",
            Material::Acrylic => "acrylic",
        }
    }
}

impl std::fmt::Display for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Material {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hdf" => Ok(Material::Hdf),
            "plywood" => Ok(Material::Plywood),
            "acrylic" => Ok(Material::Acrylic),
            other => Err(format!(
                "material must be 'hdf', 'plywood' or 'acrylic', got '{other}'"
            )),
        }
    }
}

/// Reference-data catalog a wizard step pulls its images from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Shape,
    Design,
    Material,
}

impl Category {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Shape => "shape",
            Category::Design => "design",
            Category::Material => "material",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "shape" => Ok(Category::Shape),
            "design" => Ok(Category::Design),
            "material" => Ok(Category::Material),
            other => Err(format!(
                "category must be 'shape', 'design' or 'material', got '{other}'"
            )),
        }
    }
}

/// Wall lengths in meters, indexed 1..=3.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wall3: Option<f64>,
}

impl Dimensions {
    /// Returns the length of wall `index` (1-based). Out-of-range indexes
    /// are always `None`.
    #[must_use]
    pub fn wall(&self, index: usize) -> Option<f64> {
        match index {
            1 => self.wall1,
            2 => self.wall2,
            3 => self.wall3,
            _ => None,
        }
    }

    /// Sets wall `index` (1-based). Out-of-range indexes are ignored.
    pub fn set_wall(&mut self, index: usize, meters: Option<f64>) {
        match index {
            1 => self.wall1 = meters,
            2 => self.wall2 = meters,
            3 => self.wall3 = meters,
            _ => {}
        }
    }

    /// True when every wall `shape` needs holds a positive, finite length.
    #[must_use]
    pub fn is_filled_for(&self, shape: KitchenShape) -> bool {
        (1..=shape.required_walls()).all(|i| self.wall(i).is_some_and(is_usable_length))
    }
}

/// Parses a free-text wall length the way the dimension inputs accept it.
/// Anything that is not a number yields `None`, which leaves the wall unset.
#[must_use]
pub fn parse_wall_input(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_usable_length(meters: f64) -> bool {
    meters.is_finite() && meters > 0.0
}
