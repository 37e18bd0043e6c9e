use crate::layer::LayerKind;

/// Human-readable names for every layer of a feature network, in evaluation order.
///
/// Names follow the `conv{stage}_{index}`, `relu{stage}_{index}` and `pool{stage}`
/// scheme. Layers of kind [Other](LayerKind::Other) keep their position but have no name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerCatalog {
    entries: Vec<Option<String>>,
}

impl LayerCatalog {
    /// Builds the catalog from the ordered layer kinds of a network.
    ///
    /// The stage counter starts at 1 and advances after every pooling layer, which
    /// also resets the within-stage index to 1. The index advances after every
    /// activation, so a convolution and the activation following it share a suffix.
    pub fn build<I>(kinds: I) -> Self
    where
        I: IntoIterator<Item = LayerKind>,
    {
        let mut stage = 1;
        let mut index = 1;

        let entries = kinds
            .into_iter()
            .map(|kind| match kind {
                LayerKind::Convolution => Some(format!("conv{stage}_{index}")),
                LayerKind::Activation => {
                    let name = format!("relu{stage}_{index}");
                    index += 1;
                    Some(name)
                }
                LayerKind::Pooling => {
                    let name = format!("pool{stage}");
                    stage += 1;
                    index = 1;
                    Some(name)
                }
                LayerKind::Other => None,
            })
            .collect();

        Self { entries }
    }

    /// Number of layers, named or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no layers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name of the layer at `position`, if that layer is named.
    pub fn name(&self, position: usize) -> Option<&str> {
        self.entries.get(position)?.as_deref()
    }

    /// Position of the layer called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.as_deref() == Some(name))
    }

    /// Whether some layer is called `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Every entry, aligned with the layer sequence.
    pub fn entries(&self) -> &[Option<String>] {
        &self.entries
    }

    /// Named layers only, in evaluation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| entry.as_deref())
    }
}
