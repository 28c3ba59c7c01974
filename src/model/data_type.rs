//! SQL Server column data types

use std::fmt;

/// Length argument of a character or binary type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeLength {
    Value(u32),
    Max,
}

/// A parsed column type with defaults filled in, so that `varchar` and
/// `varchar(1)` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataType {
    /// Lowercase type name (`varchar`, `int`, `dbo.mytype`)
    pub name: String,
    pub length: Option<TypeLength>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
}

const LENGTH_TYPES: &[&str] = &["char", "varchar", "nchar", "nvarchar", "binary", "varbinary"];
const INTEGER_TYPES: &[&str] = &["tinyint", "smallint", "int", "bigint"];
const FRACTIONAL_SECONDS_TYPES: &[&str] = &["datetime2", "time", "datetimeoffset"];

impl DataType {
    /// A type without arguments.
    pub fn simple(name: &str) -> Self {
        Self::from_parts(name, &[])
    }

    /// Type of a computed column, which carries no declared type.
    pub fn computed() -> Self {
        Self {
            name: String::new(),
            length: None,
            precision: None,
            scale: None,
        }
    }

    /// Build a type from its name and textual arguments (`["10"]`, `["max"]`, `["18", "2"]`).
    pub fn from_parts(name: &str, args: &[&str]) -> Self {
        let name = name.trim().to_lowercase();
        let numeric = |i: usize| args.get(i).and_then(|a| a.trim().parse::<u32>().ok());
        let mut data_type = Self {
            name,
            length: None,
            precision: None,
            scale: None,
        };

        let name = data_type.name.as_str();
        if LENGTH_TYPES.contains(&name) {
            data_type.length = Some(match args.first() {
                Some(a) if a.trim().eq_ignore_ascii_case("max") => TypeLength::Max,
                _ => TypeLength::Value(numeric(0).unwrap_or(1)),
            });
        } else if name == "decimal" || name == "numeric" {
            data_type.precision = Some(numeric(0).map_or(18, |p| p.min(38) as u8));
            data_type.scale = Some(numeric(1).map_or(0, |s| s.min(38) as u8));
        } else if FRACTIONAL_SECONDS_TYPES.contains(&name) {
            data_type.scale = Some(numeric(0).map_or(7, |s| s.min(7) as u8));
        } else if name == "float" {
            // float(1..24) is stored as real precision, anything else as 53
            data_type.precision = Some(match numeric(0) {
                Some(p) if p <= 24 => 24,
                _ => 53,
            });
        }
        data_type
    }

    pub fn is_computed(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_integer(&self) -> bool {
        INTEGER_TYPES.contains(&self.name.as_str())
    }

    pub fn is_bit(&self) -> bool {
        self.name == "bit"
    }

    /// Exact or approximate numeric types other than integers
    pub fn is_decimal(&self) -> bool {
        matches!(
            self.name.as_str(),
            "decimal" | "numeric" | "money" | "smallmoney" | "float" | "real"
        )
    }

    /// `datetime` and `smalldatetime`
    pub fn is_legacy_datetime(&self) -> bool {
        self.name == "datetime" || self.name == "smalldatetime"
    }

    pub fn is_unicode(&self) -> bool {
        matches!(self.name.as_str(), "nchar" | "nvarchar" | "ntext")
    }

    pub fn is_character(&self) -> bool {
        matches!(
            self.name.as_str(),
            "char" | "varchar" | "nchar" | "nvarchar" | "text" | "ntext" | "sysname" | "xml"
        )
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.name.as_str(), "binary" | "varbinary" | "image" | "timestamp" | "rowversion")
    }

    /// Type to cast a large-object column to before comparing it.
    pub fn comparable_cast(&self) -> Option<&'static str> {
        match self.name.as_str() {
            "text" => Some("VARCHAR(MAX)"),
            "ntext" => Some("NVARCHAR(MAX)"),
            "image" => Some("VARBINARY(MAX)"),
            _ => None,
        }
    }

    fn integer_rank(&self) -> Option<usize> {
        INTEGER_TYPES.iter().position(|t| *t == self.name)
    }

    /// Whether a column of this type can be changed to `target` with
    /// `ALTER TABLE ... ALTER COLUMN` without losing data.
    ///
    /// Only widening conversions qualify: longer strings, larger integers,
    /// decimals that keep integer digits and scale, more fractional seconds,
    /// and `char`/`varchar` to their unicode counterparts of at least the same
    /// length. Everything else needs the table to be rebuilt.
    pub fn can_widen_to(&self, target: &DataType) -> bool {
        if self == target {
            return true;
        }
        if let (Some(from), Some(to)) = (self.integer_rank(), target.integer_rank()) {
            return to >= from;
        }
        if self.name == target.name {
            return match self.name.as_str() {
                n if LENGTH_TYPES.contains(&n) => target.length >= self.length,
                "decimal" | "numeric" => {
                    let (p1, s1) = (self.precision.unwrap_or(18), self.scale.unwrap_or(0));
                    let (p2, s2) = (target.precision.unwrap_or(18), target.scale.unwrap_or(0));
                    s2 >= s1 && p2.saturating_sub(s2) >= p1.saturating_sub(s1)
                }
                n if FRACTIONAL_SECONDS_TYPES.contains(&n) => target.scale >= self.scale,
                "float" => target.precision >= self.precision,
                _ => false,
            };
        }
        let unicode_widening = matches!(
            (self.name.as_str(), target.name.as_str()),
            ("varchar", "nvarchar") | ("char", "nchar")
        );
        if unicode_widening {
            // nvarchar(n) holds n characters like varchar(n); MAX stays MAX
            return target.length >= self.length;
        }
        false
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(length) = self.length {
            match length {
                TypeLength::Value(n) => write!(f, "({})", n)?,
                TypeLength::Max => write!(f, "(max)")?,
            }
        } else if self.name == "decimal" || self.name == "numeric" {
            write!(
                f,
                "({},{})",
                self.precision.unwrap_or(18),
                self.scale.unwrap_or(0)
            )?;
        } else if let Some(scale) = self.scale {
            write!(f, "({})", scale)?;
        } else if self.name == "float" {
            if let Some(precision) = self.precision {
                write!(f, "({})", precision)?;
            }
        }
        Ok(())
    }
}
