/// A Minecraft resource identifier (e.g., "minecraft:stone").
///
/// Parsing splits once on the first `:`; both sides must be non-empty.
/// No character-class validation is performed on namespace or path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub namespace: String,
    pub path: String,
}

impl Identifier {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    pub fn minecraft(path: impl Into<String>) -> Self {
        Self::new("minecraft", path)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl std::str::FromStr for Identifier {
    type Err = IdentifierParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ns, path) = s
            .split_once(':')
            .ok_or_else(|| IdentifierParseError(s.to_string()))?;
        if ns.is_empty() || path.is_empty() {
            return Err(IdentifierParseError(s.to_string()));
        }
        Ok(Self::new(ns, path))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid resource location: {0:?}")]
pub struct IdentifierParseError(pub String);

/// A block descriptor: a resource location plus an ordered set of
/// `key=value` properties, e.g. `minecraft:furnace[facing=north,lit=true]`.
///
/// Property values are kept as opaque strings (typed coercion is a
/// deliberate non-goal); order of insertion is preserved for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    pub id: Identifier,
    pub properties: Vec<(String, String)>,
}

impl BlockState {
    pub fn new(id: Identifier) -> Self {
        Self {
            id,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push((key.into(), value.into()));
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BlockStateParseError {
    #[error("invalid resource location in block state: {0:?}")]
    Identifier(#[from] IdentifierParseError),
    #[error("block state missing closing ']': {0:?}")]
    UnterminatedProperties(String),
    #[error("malformed property pair {0:?} in block state")]
    MalformedProperty(String),
}

impl std::str::FromStr for BlockState {
    type Err = BlockStateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(bracket) = s.find('[') else {
            let id: Identifier = s.parse()?;
            return Ok(BlockState::new(id));
        };

        let (loc_text, rest) = s.split_at(bracket);
        let id: Identifier = loc_text.parse()?;
        let rest = &rest[1..]; // drop '['
        let Some(inner) = rest.strip_suffix(']') else {
            return Err(BlockStateParseError::UnterminatedProperties(s.to_string()));
        };

        let mut properties = Vec::new();
        if !inner.is_empty() {
            for pair in inner.split(',') {
                let (key, value) = pair
                    .split_once('=')
                    .ok_or_else(|| BlockStateParseError::MalformedProperty(pair.to_string()))?;
                properties.push((key.to_string(), value.to_string()));
            }
        }

        Ok(BlockState { id, properties })
    }
}

impl std::fmt::Display for BlockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)?;
        if !self.properties.is_empty() {
            write!(f, "[")?;
            for (i, (k, v)) in self.properties.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}={}", k, v)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
