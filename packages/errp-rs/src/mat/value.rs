//! In-memory representation of MATLAB level-5 arrays.
//!
//! Numeric and char payloads are kept in MATLAB's column-major order; the
//! accessors below hide that where it matters (char matrices, struct fields).

/// MATLAB array class (`mxCLASS` identifiers from the level-5 format).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatClass {
    Cell,
    Struct,
    Object,
    Char,
    Sparse,
    Double,
    Single,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
}

impl MatClass {
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            1 => MatClass::Cell,
            2 => MatClass::Struct,
            3 => MatClass::Object,
            4 => MatClass::Char,
            5 => MatClass::Sparse,
            6 => MatClass::Double,
            7 => MatClass::Single,
            8 => MatClass::Int8,
            9 => MatClass::UInt8,
            10 => MatClass::Int16,
            11 => MatClass::UInt16,
            12 => MatClass::Int32,
            13 => MatClass::UInt32,
            14 => MatClass::Int64,
            15 => MatClass::UInt64,
            _ => return None,
        })
    }

    pub fn id(self) -> u8 {
        match self {
            MatClass::Cell => 1,
            MatClass::Struct => 2,
            MatClass::Object => 3,
            MatClass::Char => 4,
            MatClass::Sparse => 5,
            MatClass::Double => 6,
            MatClass::Single => 7,
            MatClass::Int8 => 8,
            MatClass::UInt8 => 9,
            MatClass::Int16 => 10,
            MatClass::UInt16 => 11,
            MatClass::Int32 => 12,
            MatClass::UInt32 => 13,
            MatClass::Int64 => 14,
            MatClass::UInt64 => 15,
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(
            self,
            MatClass::Cell | MatClass::Struct | MatClass::Object | MatClass::Char | MatClass::Sparse
        )
    }
}

/// Payload of a MATLAB array.
#[derive(Debug, Clone, PartialEq)]
pub enum MatValue {
    /// Any numeric or logical class, widened to `f64`.
    Numeric {
        class: MatClass,
        logical: bool,
        real: Vec<f64>,
        imag: Option<Vec<f64>>,
    },
    Char(Vec<char>),
    Cell(Vec<MatArray>),
    /// `elements[i][j]` is field `fields[j]` of struct element `i`.
    Struct {
        fields: Vec<String>,
        elements: Vec<Vec<MatArray>>,
    },
}

/// A named MATLAB array with its dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct MatArray {
    pub name: String,
    pub dims: Vec<usize>,
    pub value: MatValue,
}

impl MatArray {
    /// Double array with `data` given in column-major order.
    pub fn numeric(name: impl Into<String>, dims: Vec<usize>, data: Vec<f64>) -> Self {
        Self::numeric_class(name, MatClass::Double, dims, data)
    }

    pub fn numeric_class(
        name: impl Into<String>,
        class: MatClass,
        dims: Vec<usize>,
        data: Vec<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            dims,
            value: MatValue::Numeric {
                class,
                logical: false,
                real: data,
                imag: None,
            },
        }
    }

    pub fn scalar(name: impl Into<String>, value: f64) -> Self {
        Self::numeric(name, vec![1, 1], vec![value])
    }

    /// `n × 1` double column vector.
    pub fn column(name: impl Into<String>, data: Vec<f64>) -> Self {
        let n = data.len();
        Self::numeric(name, vec![n, 1], data)
    }

    /// `1 × n` char row.
    pub fn string(name: impl Into<String>, text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Self {
            name: name.into(),
            dims: vec![1, chars.len()],
            value: MatValue::Char(chars),
        }
    }

    pub fn cell(name: impl Into<String>, dims: Vec<usize>, items: Vec<MatArray>) -> Self {
        Self {
            name: name.into(),
            dims,
            value: MatValue::Cell(items),
        }
    }

    /// `n × 1` cell of char rows.
    pub fn string_cell(name: impl Into<String>, items: &[&str]) -> Self {
        let cells = items.iter().map(|s| MatArray::string("", s)).collect();
        Self::cell(name, vec![items.len(), 1], cells)
    }

    /// `1 × 1` struct.
    pub fn structure(name: impl Into<String>, fields: Vec<(&str, MatArray)>) -> Self {
        let names = fields.iter().map(|(n, _)| n.to_string()).collect();
        let values = fields.into_iter().map(|(_, v)| v).collect();
        Self {
            name: name.into(),
            dims: vec![1, 1],
            value: MatValue::Struct {
                fields: names,
                elements: vec![values],
            },
        }
    }

    pub fn numel(&self) -> usize {
        self.dims.iter().fold(1, |acc, &d| acc.saturating_mul(d))
    }

    pub fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    pub fn class(&self) -> MatClass {
        match &self.value {
            MatValue::Numeric { class, .. } => *class,
            MatValue::Char(_) => MatClass::Char,
            MatValue::Cell(_) => MatClass::Cell,
            MatValue::Struct { .. } => MatClass::Struct,
        }
    }

    /// Rows and columns of a 2-D array.
    pub fn shape2(&self) -> Option<(usize, usize)> {
        match self.dims.as_slice() {
            [r, c] => Some((*r, *c)),
            [r, c, rest @ ..] if rest.iter().all(|&d| d == 1) => Some((*r, *c)),
            _ => None,
        }
    }

    /// Real part of a numeric array, column-major.
    pub fn real(&self) -> Option<&[f64]> {
        match &self.value {
            MatValue::Numeric { real, .. } => Some(real),
            _ => None,
        }
    }

    pub fn scalar_value(&self) -> Option<f64> {
        match self.real() {
            Some([v]) => Some(*v),
            _ => None,
        }
    }

    /// Text of a char array with a single row.
    pub fn as_string(&self) -> Option<String> {
        match &self.value {
            MatValue::Char(chars) if self.shape2().map_or(true, |(r, _)| r <= 1) => {
                Some(chars.iter().collect())
            }
            _ => None,
        }
    }

    /// Rows of a char matrix, trailing padding removed.
    pub fn char_rows(&self) -> Option<Vec<String>> {
        let MatValue::Char(chars) = &self.value else {
            return None;
        };
        let (rows, cols) = self.shape2()?;
        Some(
            (0..rows)
                .map(|r| {
                    let row: String = (0..cols).map(|c| chars[c * rows + r]).collect();
                    row.trim_end_matches(|c: char| c == ' ' || c == '\0').to_string()
                })
                .collect(),
        )
    }

    /// List of strings from a cell of char arrays or a char matrix.
    pub fn string_list(&self) -> Option<Vec<String>> {
        match &self.value {
            MatValue::Cell(items) => items
                .iter()
                .map(|item| item.as_string().map(|s| s.trim_end().to_string()))
                .collect(),
            MatValue::Char(_) => self.char_rows(),
            _ => None,
        }
    }

    /// Number of struct elements, `None` for other classes.
    pub fn struct_len(&self) -> Option<usize> {
        match &self.value {
            MatValue::Struct { elements, .. } => Some(elements.len()),
            _ => None,
        }
    }

    /// Field `name` of struct element `index`.
    pub fn field_at(&self, index: usize, name: &str) -> Option<&MatArray> {
        let MatValue::Struct { fields, elements } = &self.value else {
            return None;
        };
        let column = fields.iter().position(|f| f == name)?;
        elements.get(index)?.get(column)
    }

    /// Field of the first struct element.
    pub fn field(&self, name: &str) -> Option<&MatArray> {
        self.field_at(0, name)
    }

    pub fn field_names(&self) -> &[String] {
        match &self.value {
            MatValue::Struct { fields, .. } => fields,
            _ => &[],
        }
    }
}
