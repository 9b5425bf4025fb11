// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::quota::{QuotaFigures, QuotaViolation};
use serde::{Deserialize, Serialize};

/// Stable, machine-readable reasons a participation request or supervisor
/// decision was refused.
///
/// The string codes are part of the external contract and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectionCode {
    OperationInactive,
    MemberInactive,
    OperationInPast,
    DuplicateParticipation,
    InsufficientLeadTime,
    InvalidParticipationStatus,
    QueueFull,
    ActivityLimitExceeded,
    PerDiemLimitExceeded,
    NoVacancy,
    InvalidTransition,
    JustificationRequired,
    JustificationTooShort,
}

impl RejectionCode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OperationInactive => "OPERACAO_INATIVA",
            Self::MemberInactive => "MEMBRO_INATIVO",
            Self::OperationInPast => "OPERACAO_PASSADO",
            Self::DuplicateParticipation => "PARTICIPACAO_DUPLICADA",
            Self::InsufficientLeadTime => "ANTECEDENCIA_INSUFICIENTE",
            Self::InvalidParticipationStatus => "STATUS_INVALIDO_PARTICIPACAO",
            Self::QueueFull => "FILA_LOTADA",
            Self::ActivityLimitExceeded => "LIMITE_ATIVIDADES",
            Self::PerDiemLimitExceeded => "LIMITE_DIARIAS",
            Self::NoVacancy => "SEM_VAGAS",
            Self::InvalidTransition => "TRANSICAO_INVALIDA",
            Self::JustificationRequired => "JUSTIFICATIVA_OBRIGATORIA",
            Self::JustificationTooShort => "JUSTIFICATIVA_INSUFICIENTE",
        }
    }
}

impl std::fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<QuotaViolation> for RejectionCode {
    fn from(violation: QuotaViolation) -> Self {
        match violation {
            QuotaViolation::ActivityLimit => Self::ActivityLimitExceeded,
            QuotaViolation::PerDiemThreshold | QuotaViolation::PerDiemLimit => {
                Self::PerDiemLimitExceeded
            }
        }
    }
}

/// A structured business refusal.
///
/// Rejections are ordinary results, not errors: the request was understood
/// and evaluated, and the answer is no.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub code: RejectionCode,
    pub message: String,
    /// Quota figures, attached when a quota limit caused the refusal.
    pub quota: Option<QuotaFigures>,
}

impl Rejection {
    #[must_use]
    pub fn new(code: RejectionCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            quota: None,
        }
    }

    /// Builds a quota refusal carrying the computed figures.
    #[must_use]
    pub fn quota(violation: QuotaViolation, figures: QuotaFigures) -> Self {
        let message: String = match violation {
            QuotaViolation::ActivityLimit => format!(
                "Activity limit reached: {} of {} in cycle {}..={}",
                figures.activities, figures.activity_limit, figures.cycle.start, figures.cycle.end
            ),
            QuotaViolation::PerDiemThreshold => format!(
                "Per-diem units would reach {:.1}, the hard threshold is {:.1}",
                figures.per_diem_units, figures.per_diem_hard_threshold
            ),
            QuotaViolation::PerDiemLimit => format!(
                "Per-diem units would reach {:.1} of {:.1} this month",
                figures.per_diem_units, figures.per_diem_limit
            ),
        };
        Self {
            code: RejectionCode::from(violation),
            message,
            quota: Some(figures),
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
