//! Display color and label lookups for enumerated values
//!
//! Every lookup takes the raw serialized value. Unknown or empty values
//! never fail: they come back gray with the raw value as label.

use serde::Serialize;
use std::borrow::Cow;

use crate::analysis::matrix::SeverityBand;

pub const GREEN: &str = "#28a745";
pub const YELLOW: &str = "#ffc107";
pub const RED: &str = "#dc3545";
pub const GRAY: &str = "#6c757d";
pub const CYAN: &str = "#17a2b8";
pub const BLUE: &str = "#007bff";
pub const TEAL: &str = "#20c997";
pub const PURPLE: &str = "#6f42c1";
pub const ORANGE: &str = "#fd7e14";
pub const PINK: &str = "#e83e8c";
pub const DARK: &str = "#343a40";

/// Terminal rendering hint for a badge color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Success,
    Warning,
    Danger,
    Info,
    Primary,
    Accent,
    Neutral,
}

impl Tone {
    fn of(color: &str) -> Self {
        match color {
            GREEN | TEAL => Tone::Success,
            YELLOW | ORANGE => Tone::Warning,
            RED | PINK => Tone::Danger,
            CYAN => Tone::Info,
            BLUE => Tone::Primary,
            PURPLE => Tone::Accent,
            _ => Tone::Neutral,
        }
    }
}

/// A color and display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub color: &'static str,
    pub tone: Tone,
    pub label: Cow<'static, str>,
}

impl Badge {
    fn known(color: &'static str, label: &'static str) -> Self {
        Self {
            color,
            tone: Tone::of(color),
            label: Cow::Borrowed(label),
        }
    }

    /// Neutral gray echoing the raw value
    pub fn fallback(raw: &str) -> Self {
        Self {
            color: GRAY,
            tone: Tone::Neutral,
            label: Cow::Owned(raw.to_string()),
        }
    }
}

/// Background and text colors of a risk status pill
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusStyle {
    pub background: &'static str,
    pub foreground: &'static str,
    pub label: Cow<'static, str>,
}

pub fn item_status(value: &str) -> Badge {
    match value {
        "concluido" => Badge::known(GREEN, "Concluído"),
        "em_andamento" => Badge::known(YELLOW, "Em Andamento"),
        "pendente" => Badge::known(GRAY, "Pendente"),
        other => Badge::fallback(other),
    }
}

pub fn risk_rating(value: &str) -> Badge {
    match value {
        "alto" => Badge::known(RED, "Alto"),
        "medio" => Badge::known(YELLOW, "Médio"),
        "baixo" => Badge::known(GREEN, "Baixo"),
        other => Badge::fallback(other),
    }
}

pub fn priority(value: &str) -> Badge {
    match value {
        "alta" => Badge::known(RED, "Alta"),
        "media" => Badge::known(YELLOW, "Média"),
        "baixa" => Badge::known(GREEN, "Baixa"),
        other => Badge::fallback(other),
    }
}

pub fn risk_status(value: &str) -> StatusStyle {
    let (background, foreground, label) = match value {
        "identificado" => ("#cfe2ff", "#0a3678", "Identificado"),
        "analisado" => ("#fff3cd", "#664d03", "Analisado"),
        "avaliado" => ("#f8d7da", "#58151c", "Avaliado"),
        "em_tratamento" => ("#d1ecf1", "#0c5460", "Em Tratamento"),
        "mitigado" => ("#d4edda", "#155724", "Mitigado"),
        "aceito" => ("#e2e3e5", "#383d41", "Aceito"),
        "fechado" => ("#d6d8db", "#1b1e21", "Fechado"),
        other => {
            return StatusStyle {
                background: "#f8f9fa",
                foreground: "#212529",
                label: Cow::Owned(other.to_string()),
            }
        }
    };
    StatusStyle {
        background,
        foreground,
        label: Cow::Borrowed(label),
    }
}

/// Risk status as a badge, keyed on the pill's text color
pub fn risk_status_badge(value: &str) -> Badge {
    match value {
        "identificado" => Badge::known(BLUE, "Identificado"),
        "analisado" => Badge::known(YELLOW, "Analisado"),
        "avaliado" => Badge::known(RED, "Avaliado"),
        "em_tratamento" => Badge::known(CYAN, "Em Tratamento"),
        "mitigado" => Badge::known(GREEN, "Mitigado"),
        "aceito" => Badge::known(GRAY, "Aceito"),
        "fechado" => Badge::known(DARK, "Fechado"),
        other => Badge::fallback(other),
    }
}

pub fn plan_status(value: &str) -> Badge {
    match value {
        "cancelado" => Badge::known(DARK, "Cancelado"),
        other => item_status(other),
    }
}

pub fn training_status(value: &str) -> Badge {
    match value {
        "nao_iniciado" => Badge::known(GRAY, "Não Iniciado"),
        "em_andamento" => Badge::known(YELLOW, "Em Andamento"),
        "concluido" => Badge::known(GREEN, "Concluído"),
        "pendente_aprovacao" => Badge::known(CYAN, "Pendente Aprovação"),
        other => Badge::fallback(other),
    }
}

pub fn notification_type(value: &str) -> Badge {
    match value {
        "vencimento_proximo" => Badge::known(YELLOW, "Vencimento Próximo"),
        "item_atualizado" => Badge::known(CYAN, "Item Atualizado"),
        "evidencia_adicionada" => Badge::known(GREEN, "Evidência Adicionada"),
        "documento_gerado" => Badge::known(BLUE, "Documento Gerado"),
        other => Badge::fallback(other),
    }
}

pub fn notification_status(value: &str) -> Badge {
    match value {
        "nao_lida" => Badge::known(BLUE, "Não lida"),
        "lida" => Badge::known(GRAY, "Lida"),
        "arquivada" => Badge::known(DARK, "Arquivada"),
        other => Badge::fallback(other),
    }
}

pub fn action_type(value: &str) -> Badge {
    match value {
        "create" => Badge::known(GREEN, "Criação"),
        "read" => Badge::known(CYAN, "Leitura"),
        "update" => Badge::known(YELLOW, "Atualização"),
        "delete" => Badge::known(RED, "Exclusão"),
        "login" => Badge::known(BLUE, "Login"),
        "logout" => Badge::known(GRAY, "Logout"),
        "export" => Badge::known(TEAL, "Exportação"),
        "generate" => Badge::known(PURPLE, "Geração"),
        "upload" => Badge::known(ORANGE, "Upload"),
        "download" => Badge::known(PINK, "Download"),
        other => Badge::fallback(other),
    }
}

/// Entity type labels; all share the neutral color
pub fn entity_type(value: &str) -> Badge {
    let label = match value {
        "user" => "Usuário",
        "checklist" => "Checklist",
        "checklist_item" => "Item de Checklist",
        "evidencia" => "Evidência",
        "documento" => "Documento",
        "notification" => "Notificação",
        "system" => "Sistema",
        "risco" => "Risco",
        "avaliacao_risco" => "Avaliação de Risco",
        "plano_tratamento" => "Plano de Tratamento",
        "treinamento" => "Treinamento",
        "status_treinamento" => "Status de Treinamento",
        other => return Badge::fallback(other),
    };
    Badge::known(GRAY, label)
}

/// Matrix cell background for a severity band
pub fn severity_band(band: SeverityBand) -> Badge {
    match band {
        SeverityBand::Baixo => Badge {
            color: "#d4edda",
            tone: Tone::Success,
            label: Cow::Borrowed("Baixo"),
        },
        SeverityBand::Medio => Badge {
            color: "#fff3cd",
            tone: Tone::Warning,
            label: Cow::Borrowed("Médio"),
        },
        SeverityBand::Alto => Badge {
            color: "#f8d7da",
            tone: Tone::Danger,
            label: Cow::Borrowed("Alto"),
        },
        SeverityBand::Critico => Badge {
            color: "#f5c6cb",
            tone: Tone::Danger,
            label: Cow::Borrowed("Crítico"),
        },
    }
}

/// Conformity color: >= 80 green, >= 50 yellow, otherwise red
pub fn conformity(percent: u32) -> Badge {
    let color = if percent >= 80 {
        GREEN
    } else if percent >= 50 {
        YELLOW
    } else {
        RED
    };
    Badge {
        color,
        tone: Tone::of(color),
        label: Cow::Owned(format!("{}%", percent)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_risk_lookups() {
        assert_eq!(item_status("concluido").color, GREEN);
        assert_eq!(item_status("em_andamento").label, "Em Andamento");
        assert_eq!(risk_rating("alto").color, RED);
        assert_eq!(risk_rating("medio").label, "Médio");
        assert_eq!(priority("baixa").tone, Tone::Success);
    }

    #[test]
    fn test_unknown_values_fall_back_to_gray() {
        for badge in [
            item_status("arquivado"),
            risk_rating(""),
            action_type("approve"),
            entity_type("fornecedor"),
            notification_type("lembrete"),
            training_status("x"),
        ] {
            assert_eq!(badge.color, GRAY);
            assert_eq!(badge.tone, Tone::Neutral);
        }
        assert_eq!(action_type("approve").label, "approve");
        assert_eq!(risk_status("revisado").background, "#f8f9fa");
        assert_eq!(risk_status("revisado").label, "revisado");
    }

    #[test]
    fn test_action_colors() {
        assert_eq!(action_type("login").color, "#007bff");
        assert_eq!(action_type("export").color, "#20c997");
        assert_eq!(action_type("generate").color, "#6f42c1");
        assert_eq!(action_type("download").color, "#e83e8c");
        assert_eq!(action_type("upload").label, "Upload");
    }

    #[test]
    fn test_risk_status_pill() {
        let style = risk_status("identificado");
        assert_eq!(style.background, "#cfe2ff");
        assert_eq!(style.foreground, "#0a3678");
        assert_eq!(risk_status("em_tratamento").label, "Em Tratamento");
    }

    #[test]
    fn test_conformity_thresholds() {
        assert_eq!(conformity(80).color, GREEN);
        assert_eq!(conformity(79).color, YELLOW);
        assert_eq!(conformity(50).color, YELLOW);
        assert_eq!(conformity(49).color, RED);
        assert_eq!(conformity(0).label, "0%");
    }

    #[test]
    fn test_entity_labels() {
        assert_eq!(entity_type("checklist_item").label, "Item de Checklist");
        assert_eq!(entity_type("plano_tratamento").label, "Plano de Tratamento");
    }

    #[test]
    fn test_severity_band_colors() {
        assert_eq!(severity_band(SeverityBand::Critico).label, "Crítico");
        assert_eq!(severity_band(SeverityBand::Baixo).color, "#d4edda");
    }
}
