// src/services/document_service.rs

use genpdf::{elements, style, Alignment, Element};
use image::Luma;
use qrcode::QrCode;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CustomerRepository, OrganizationRepository, UserRepository},
    models::orders::{OrderStatus, ServiceOrder},
};

#[derive(Clone)]
pub struct DocumentService {
    org_repo: OrganizationRepository,
    user_repo: UserRepository,
    customer_repo: CustomerRepository,
    pool: sqlx::PgPool,
    font_dir: String,
}

impl DocumentService {
    pub fn new(
        org_repo: OrganizationRepository,
        user_repo: UserRepository,
        customer_repo: CustomerRepository,
        pool: sqlx::PgPool,
        font_dir: String,
    ) -> Self {
        Self {
            org_repo,
            user_repo,
            customer_repo,
            pool,
            font_dir,
        }
    }

    /// Gera a ficha imprimível da OS. A autorização de leitura já aconteceu:
    /// quem chama entrega uma OS que o usuário pode ver.
    pub async fn generate_order_sheet(&self, order: &ServiceOrder) -> Result<Vec<u8>, AppError> {
        // 1. Busca os nomes para o cabeçalho
        let org_name = self
            .org_repo
            .find_by_id(order.organization_id)
            .await?
            .map(|o| o.name)
            .unwrap_or_else(|| "Ordem de Serviço".to_string());

        let customer_name = match order.customer_id {
            Some(cid) => self
                .customer_repo
                .find_in_org(&self.pool, order.organization_id, cid)
                .await?
                .map(|c| c.name),
            None => None,
        };

        let assignee_name = match order.assigned_to {
            Some(uid) => self.user_repo.find_by_id(uid).await?.map(|u| u.name),
            None => None,
        };

        // 2. Configura o PDF
        let font_family = genpdf::fonts::from_files(&self.font_dir, "Roboto", None)
            .map_err(|_| {
                AppError::FontNotFound(format!("Fonte não encontrada na pasta {}", self.font_dir))
            })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("OS {}", short_id(order.id)));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(
            elements::Paragraph::new(org_name)
                .styled(style::Style::new().bold().with_font_size(18)),
        );
        doc.push(elements::Break::new(1.0));

        doc.push(
            elements::Paragraph::new(format!("ORDEM DE SERVIÇO #{}", short_id(order.id)))
                .styled(style::Style::new().bold().with_font_size(14)),
        );
        doc.push(elements::Paragraph::new(format!(
            "Aberta em: {}",
            order.created_at.format("%d/%m/%Y")
        )));
        if let Some(scheduled) = order.scheduled_at {
            doc.push(elements::Paragraph::new(format!(
                "Agendada para: {}",
                scheduled.format("%d/%m/%Y %H:%M")
            )));
        }
        doc.push(elements::Break::new(1.5));

        // --- DADOS ---
        let mut table = elements::TableLayout::new(vec![1, 3]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));
        let style_bold = style::Style::new().bold();

        let rows: Vec<(&str, String)> = vec![
            ("Título", order.title.clone()),
            ("Status", status_label(order.status).to_string()),
            (
                "Cliente",
                customer_name.unwrap_or_else(|| "Não informado".to_string()),
            ),
            (
                "Responsável",
                assignee_name.unwrap_or_else(|| "Não atribuído".to_string()),
            ),
        ];

        for (label, value) in rows {
            table
                .row()
                .element(elements::Paragraph::new(label).styled(style_bold))
                .element(elements::Paragraph::new(value))
                .push()
                .expect("Table row error");
        }
        doc.push(table);
        doc.push(elements::Break::new(1.5));

        if let Some(description) = &order.description {
            doc.push(elements::Paragraph::new("Descrição do serviço").styled(style_bold));
            doc.push(elements::Paragraph::new(description.clone()));
            doc.push(elements::Break::new(1.5));
        }

        if let Some(reason) = &order.closing_reason {
            doc.push(elements::Paragraph::new("Fechamento").styled(style_bold));
            doc.push(elements::Paragraph::new(reason.clone()));
            if let Some(closed_at) = order.closed_at {
                doc.push(elements::Paragraph::new(format!(
                    "Fechada em: {}",
                    closed_at.format("%d/%m/%Y %H:%M")
                )));
            }
            doc.push(elements::Break::new(1.5));
        }

        // --- QR CODE (identificador da OS, para consulta em campo) ---
        let code = QrCode::new(order.id.to_string().as_bytes())
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

        let pdf_image = genpdf::elements::Image::from_dynamic_image(dynamic_image)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?
            .with_scale(genpdf::Scale::new(0.5, 0.5));

        doc.push(pdf_image);

        let mut footer = elements::Paragraph::new(format!("OS {}", order.id));
        footer.set_alignment(Alignment::Right);
        doc.push(footer.styled(style::Style::new().italic().with_font_size(8)));

        // 3. Renderiza para buffer em memória
        let mut buffer = Vec::new();
        doc.render(&mut buffer)
            .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;

        Ok(buffer)
    }
}

// Prefixo legível do UUID para impressão
fn short_id(id: Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pendente => "Pendente",
        OrderStatus::EmAndamento => "Em andamento",
        OrderStatus::Concluida => "Concluída",
        OrderStatus::Encerrada => "Encerrada (fora do prazo)",
        OrderStatus::Reprovada => "Reprovada",
    }
}
