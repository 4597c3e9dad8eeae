//! Alert Generator: derives alerts from raw state, independent
//! of ranking. Pure, no I/O.

use chrono::{DateTime, Utc};

use crate::constraint_evaluator;
use crate::model::{Alert, AlertType, Train};

/// Generate alerts for every train, sorted by severity descending (stable
/// within a severity level).
pub fn generate(trains: &[Train], now: DateTime<Utc>) -> Vec<Alert> {
    let mut alerts = Vec::new();

    for train in trains {
        let eval = constraint_evaluator::evaluate(train, now);

        if eval.days_to_expiry < 0 {
            alerts.push(Alert {
                alert_type: AlertType::Critical,
                message: format!("{} fitness certificate has expired", train.code),
                train_code: train.code.clone(),
                severity: 5,
            });
        } else if eval.days_to_expiry <= 3 {
            alerts.push(Alert {
                alert_type: AlertType::Critical,
                message: format!(
                    "{} fitness certificate expires in {} days",
                    train.code, eval.days_to_expiry
                ),
                train_code: train.code.clone(),
                severity: 5,
            });
        } else if eval.days_to_expiry <= 7 {
            alerts.push(Alert {
                alert_type: AlertType::Warning,
                message: format!(
                    "{} fitness certificate expires in {} days",
                    train.code, eval.days_to_expiry
                ),
                train_code: train.code.clone(),
                severity: 3,
            });
        }

        if eval.maintenance_due {
            alerts.push(Alert {
                alert_type: AlertType::Warning,
                message: format!("{} maintenance is due", train.code),
                train_code: train.code.clone(),
                severity: 4,
            });
        }

        if !train.operational.available_for_service {
            alerts.push(Alert {
                alert_type: AlertType::Info,
                message: format!("{} is not available for service", train.code),
                train_code: train.code.clone(),
                severity: 2,
            });
        }
    }

    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Branding, Cleaning, CleaningState, Fitness, Maintenance, MaintenanceState, Operational};
    use chrono::Duration;
    use uuid::Uuid;

    fn train(code: &str, expiry: DateTime<Utc>) -> Train {
        let now = Utc::now();
        Train {
            id: Uuid::new_v4(),
            code: code.into(),
            fitness: Fitness {
                valid: true,
                expiry,
                last_inspection: None,
            },
            maintenance: Maintenance {
                status: MaintenanceState::Operational,
                last_maintenance: now - Duration::days(10),
                next_maintenance_due: now + Duration::days(30),
            },
            cleaning: Cleaning {
                status: CleaningState::Clean,
            },
            operational: Operational {
                current_mileage: 5000,
                current_location: "Depot A".into(),
                available_for_service: true,
                total_operational_hours: 1000.0,
            },
            branding: Branding {
                has_branding: false,
                campaign: String::new(),
                priority: 1,
            },
            performance_score: 0.0,
            reliability_score: 0.0,
        }
    }

    /// Scenario 3.
    #[test]
    fn fitness_expiry_alert_tiers() {
        let now = Utc::now();
        let ts04 = train("TS-04", now + Duration::days(2));
        let ts05 = train("TS-05", now + Duration::days(6));
        let ts06 = train("TS-06", now - Duration::days(1));

        let alerts = generate(&[ts04, ts05, ts06], now);

        let critical_expiring = alerts
            .iter()
            .find(|a| a.train_code == "TS-04")
            .expect("TS-04 alert");
        assert_eq!(critical_expiring.alert_type, AlertType::Critical);
        assert_eq!(critical_expiring.severity, 5);
        assert!(critical_expiring.message.contains("expires in 2 days"));

        let warning = alerts.iter().find(|a| a.train_code == "TS-05").expect("TS-05 alert");
        assert_eq!(warning.alert_type, AlertType::Warning);
        assert_eq!(warning.severity, 3);

        let expired = alerts.iter().find(|a| a.train_code == "TS-06").expect("TS-06 alert");
        assert_eq!(expired.alert_type, AlertType::Critical);
        assert!(expired.message.contains("has expired"));
    }

    #[test]
    fn alerts_sorted_by_severity_descending() {
        let now = Utc::now();
        let mut unavailable = train("TS-07", now + Duration::days(30));
        unavailable.operational.available_for_service = false;
        let mut due = train("TS-08", now + Duration::days(30));
        due.maintenance.status = MaintenanceState::MaintenanceDue;

        let alerts = generate(&[unavailable, due], now);
        let severities: Vec<u8> = alerts.iter().map(|a| a.severity).collect();
        let mut sorted = severities.clone();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(severities, sorted);
    }

    #[test]
    fn healthy_train_has_no_alerts() {
        let now = Utc::now();
        let t = train("TS-09", now + Duration::days(90));
        assert!(generate(&[t], now).is_empty());
    }
}
