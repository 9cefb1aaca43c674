//! Reference microstate templates used to put fitted centers in a canonical order.

use std::collections::HashSet;
use std::sync::LazyLock;

use crate::centers::ClusterCenters;
use crate::error::ClusterError;

const BUILTIN_CHANNELS: [&str; 26] = [
    "Fp1", "Fp2", "F7", "F3", "Fz", "F4", "F8", "FC3", "FCz", "FC4", "T3", "C3", "Cz", "C4", "T4",
    "CP3", "CPz", "CP4", "T5", "P3", "Pz", "P4", "T6", "O1", "Oz", "O2",
];

#[rustfmt::skip]
const BUILTIN_MAPS: [[f64; 26]; 5] = [
    [
        -0.13234463, -0.19008217, -0.01808156, -0.06665204, -0.18127315,
        -0.25741473, -0.2313206, 0.04239534, -0.14411298, -0.25635016,
        0.1831745, 0.17520883, -0.06034687, -0.21948988, -0.2057277,
        0.27723199, 0.04632557, -0.1383458, 0.36954792, 0.33889126,
        0.1425386, -0.05140216, -0.07532628, 0.32313928, 0.21629226,
        0.11352515,
    ],
    [
        -0.15034466, -0.08511373, -0.19531161, -0.24267313, -0.16871454,
        -0.04761393, 0.02482456, -0.26414511, -0.15066143, 0.04628036,
        -0.1973625, -0.24065874, -0.08569745, 0.1729162, 0.22345117,
        -0.17553494, 0.00688743, 0.25853483, -0.09196588, -0.09478585,
        0.09460047, 0.32742083, 0.4325027, 0.09535141, 0.1959104,
        0.31190313,
    ],
    [
        0.29388541, 0.2886461, 0.27804376, 0.22674127, 0.21938115,
        0.21720292, 0.25153101, 0.12125869, 0.10996983, 0.10638135,
        0.11575272, -0.01388831, -0.04507772, -0.03708886, 0.08203929,
        -0.14818182, -0.20299531, -0.16658826, -0.09488949, -0.23512102,
        -0.30464665, -0.25762648, -0.14058166, -0.22072284, -0.22175042,
        -0.22167467,
    ],
    [
        -0.21660409, -0.22350361, -0.27855619, -0.0097109, 0.07119601,
        0.00385336, -0.24792901, 0.08145982, 0.23290418, 0.09985582,
        -0.24242583, 0.13516244, 0.3304661, 0.16710186, -0.21832217,
        0.15575575, 0.33346027, 0.18885162, -0.21687347, 0.10926662,
        0.26182733, 0.13760157, -0.19536083, -0.15966419, -0.14684497,
        -0.15296749,
    ],
    [
        -0.12444958, -0.12317709, -0.06189361, -0.20820917, -0.25736043,
        -0.20740485, -0.06941215, -0.18086612, -0.26979589, -0.17602898,
        0.05332203, -0.10101208, -0.20095764, -0.09582802, 0.06883067,
        0.0082463, -0.07052899, 0.00917889, 0.26984673, 0.13288481,
        0.08062487, 0.13616082, 0.30845643, 0.36843231, 0.35510687,
        0.35583386,
    ],
];

static BUILTIN: LazyLock<ReferenceTemplate> = LazyLock::new(|| ReferenceTemplate {
    name: "canonical-5".to_owned(),
    version: "1".to_owned(),
    channel_names: BUILTIN_CHANNELS.iter().map(|&s| s.to_owned()).collect(),
    maps: ClusterCenters::from_flat(
        BUILTIN_CHANNELS.len(),
        BUILTIN_MAPS.iter().flatten().copied().collect(),
    ),
});

/// A named set of reference topographies over labeled channels.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTemplate {
    name: String,
    version: String,
    channel_names: Vec<String>,
    maps: ClusterCenters,
}

impl ReferenceTemplate {
    /// Create a user-supplied template.
    ///
    /// Channel names are compared case-insensitively and must be unique.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ClusterError::InvalidTemplate`] | Name count differs from map width, or names repeat |
    /// | [`ClusterError::InvalidK`] | Fewer than 2 maps |
    /// | [`ClusterError::Signal`] | Ragged or non-finite maps |
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        version: impl Into<String>,
        channel_names: impl IntoIterator<Item = S>,
        maps: Vec<Vec<f64>>,
    ) -> Result<Self, ClusterError> {
        let maps = ClusterCenters::from_rows(maps)?;
        let channel_names: Vec<String> = channel_names.into_iter().map(Into::into).collect();
        if channel_names.len() != maps.n_channels() {
            return Err(ClusterError::InvalidTemplate {
                reason: format!(
                    "{} channel names for maps of width {}",
                    channel_names.len(),
                    maps.n_channels()
                ),
            });
        }
        let mut seen = HashSet::with_capacity(channel_names.len());
        if let Some(dup) = channel_names.iter().find(|n| !seen.insert(n.to_lowercase())) {
            return Err(ClusterError::InvalidTemplate { reason: format!("duplicate channel {dup}") });
        }
        Ok(Self {
            name: name.into(),
            version: version.into(),
            channel_names,
            maps,
        })
    }

    /// The built-in five-map template over 26 channels of the 10-20 system.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Channel labels, one per map column.
    #[must_use]
    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    /// Reference topographies, one row per template state.
    #[must_use]
    pub fn maps(&self) -> &ClusterCenters {
        &self.maps
    }
}

#[cfg(test)]
mod tests {
    use super::ReferenceTemplate;
    use crate::error::ClusterError;

    #[test]
    fn builtin_shape() {
        let t = ReferenceTemplate::builtin();
        assert_eq!(t.maps().n_clusters(), 5);
        assert_eq!(t.maps().n_channels(), 26);
        assert_eq!(t.channel_names().len(), 26);
        assert_eq!(t.channel_names()[0], "Fp1");
        assert_eq!(t.channel_names()[25], "O2");
        assert_eq!(t.maps().row(2)[0], 0.29388541);
    }

    #[test]
    fn builtin_is_shared() {
        assert!(std::ptr::eq(ReferenceTemplate::builtin(), ReferenceTemplate::builtin()));
    }

    #[test]
    fn custom_template_validation() {
        let ok = ReferenceTemplate::new("t", "0", ["a", "b"], vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert!(ok.is_ok());

        let width = ReferenceTemplate::new("t", "0", ["a"], vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert!(matches!(width, Err(ClusterError::InvalidTemplate { .. })));

        let dup = ReferenceTemplate::new("t", "0", ["Cz", "cz"], vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert!(matches!(dup, Err(ClusterError::InvalidTemplate { .. })));
    }
}
