use cloud_client::UserSizeInfo;
use serde::Serialize;

const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Point-in-time storage totals for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CapacitySnapshot {
    pub personal_total_bytes: u64,
    pub family_total_bytes: u64,
}

impl From<UserSizeInfo> for CapacitySnapshot {
    fn from(info: UserSizeInfo) -> Self {
        Self {
            personal_total_bytes: info.cloud_capacity_info.total_size,
            family_total_bytes: info.family_capacity_info.total_size,
        }
    }
}

/// Before/after comparison for one primary account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityReport {
    /// Masked account identifier.
    pub account: String,
    pub before: CapacitySnapshot,
    pub after: CapacitySnapshot,
}

impl CapacityReport {
    pub fn new(
        account: impl Into<String>,
        before: CapacitySnapshot,
        after: CapacitySnapshot,
    ) -> Self {
        Self {
            account: account.into(),
            before,
            after,
        }
    }

    pub fn personal_delta_mib(&self) -> i64 {
        delta_mib(self.before.personal_total_bytes, self.after.personal_total_bytes)
    }

    pub fn family_delta_mib(&self) -> i64 {
        delta_mib(self.before.family_total_bytes, self.after.family_total_bytes)
    }

    /// The report block written to the run log, ending with a blank spacer line.
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Account {}:", self.account),
            format!(
                "Before personal: {}G, family: {}G",
                gib(self.before.personal_total_bytes),
                gib(self.before.family_total_bytes)
            ),
            format!(
                "After personal: {}G, family: {}G",
                gib(self.after.personal_total_bytes),
                gib(self.after.family_total_bytes)
            ),
            format!(
                "Personal capacity change: {}M, family capacity change: {}M",
                self.personal_delta_mib(),
                self.family_delta_mib()
            ),
            " ".to_string(),
        ]
    }
}

/// Bytes as GiB with three decimals.
pub fn gib(bytes: u64) -> String {
    format!("{:.3}", bytes as f64 / GIB)
}

/// Signed difference in whole MiB, rounded half away from zero.
pub fn delta_mib(before: u64, after: u64) -> i64 {
    ((after as f64 - before as f64) / MIB).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloud_client::CapacityInfo;

    const ONE_GIB: u64 = 1 << 30;
    const ONE_MIB: u64 = 1 << 20;

    #[test]
    fn gib_uses_three_decimals() {
        assert_eq!(gib(ONE_GIB), "1.000");
        assert_eq!(gib(ONE_GIB + 10 * ONE_MIB), "1.010");
        assert_eq!(gib(0), "0.000");
    }

    #[test]
    fn delta_is_signed_and_rounded() {
        assert_eq!(delta_mib(ONE_GIB, ONE_GIB + 10 * ONE_MIB), 10);
        assert_eq!(delta_mib(ONE_GIB + ONE_MIB, ONE_GIB), -1);
        assert_eq!(delta_mib(0, ONE_MIB / 2), 1);
        assert_eq!(delta_mib(5, 5), 0);
    }

    #[test]
    fn snapshot_from_size_info() {
        let info = UserSizeInfo {
            cloud_capacity_info: CapacityInfo {
                total_size: 7,
                used_size: 1,
            },
            family_capacity_info: CapacityInfo {
                total_size: 9,
                used_size: 0,
            },
        };
        let snap = CapacitySnapshot::from(info);
        assert_eq!(snap.personal_total_bytes, 7);
        assert_eq!(snap.family_total_bytes, 9);
    }

    #[test]
    fn report_lines() {
        let before = CapacitySnapshot {
            personal_total_bytes: ONE_GIB,
            family_total_bytes: 2 * ONE_GIB,
        };
        let after = CapacitySnapshot {
            personal_total_bytes: ONE_GIB + 10 * ONE_MIB,
            family_total_bytes: 2 * ONE_GIB,
        };
        let report = CapacityReport::new("138****5678", before, after);
        assert_eq!(
            report.lines(),
            vec![
                "Account 138****5678:",
                "Before personal: 1.000G, family: 2.000G",
                "After personal: 1.010G, family: 2.000G",
                "Personal capacity change: 10M, family capacity change: 0M",
                " ",
            ]
        );
        assert_eq!(report.before, before);
    }
}
