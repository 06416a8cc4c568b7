// src/services/access.rs
//
// Política de acesso. Avaliada sempre na mesma ordem:
//   1. admin global passa;
//   2. a organização do recurso deve ser a do usuário, senão 403 independente do papel;
//   3. gate de papel por classe de operação;
//   4. registro de proprietário só é alterável pelo admin.
// Papéis e ações são enums fechados: um papel novo não passa por nenhuma
// checagem sem aparecer explicitamente aqui.

use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{User, UserRole},
        orders::ServiceOrder,
    },
};

/// Classes de operação sobre uma OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Read,
    Edit,
    ChangeStatus,
    Transfer,
    Delete,
}

/// Organização do próprio usuário, obrigatória para operações org-escopadas.
pub fn require_org(user: &User) -> Result<Uuid, AppError> {
    user.organization_id
        .ok_or_else(|| AppError::ResourceNotFound("Organização".to_string()))
}

/// Regra 1 + 2: admin passa; os demais precisam estar na organização do recurso.
pub fn authorize_org(user: &User, resource_org: Uuid) -> Result<(), AppError> {
    if user.role == UserRole::Admin {
        return Ok(());
    }
    if user.organization_id == Some(resource_org) {
        Ok(())
    } else {
        Err(AppError::WrongOrganization)
    }
}

/// Gestão de equipe e clientes: owner, manager ou admin.
pub fn authorize_management(user: &User, resource_org: Uuid) -> Result<(), AppError> {
    authorize_org(user, resource_org)?;
    if user.role.is_management() {
        Ok(())
    } else {
        Err(AppError::InsufficientRole)
    }
}

/// Operações sobre uma OS específica.
pub fn authorize_order(user: &User, order: &ServiceOrder, action: OrderAction) -> Result<(), AppError> {
    authorize_org(user, order.organization_id)?;

    let is_assignee = order.assigned_to == Some(user.id);

    let allowed = match action {
        OrderAction::Read => user.role.is_management() || user.can_view_all || is_assignee,
        // O responsável atual pode editar, mudar status e transferir...
        OrderAction::Edit | OrderAction::ChangeStatus | OrderAction::Transfer => {
            user.role.is_management() || is_assignee
        }
        // ...mas nunca excluir sozinho
        OrderAction::Delete => user.role.is_management(),
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::InsufficientRole)
    }
}

/// Alteração de um registro de usuário (edição/desativação de membro).
pub fn authorize_member_update(actor: &User, subject: &User) -> Result<(), AppError> {
    if actor.role == UserRole::Admin {
        return Ok(());
    }

    match subject.organization_id {
        Some(org) => authorize_org(actor, org)?,
        // Sujeito sem organização (admin global): fora do alcance de qualquer tenant
        None => return Err(AppError::WrongOrganization),
    }

    if !actor.role.is_management() {
        return Err(AppError::InsufficientRole);
    }

    // Registro de proprietário é protegido, mesmo dentro da organização
    if subject.role == UserRole::Owner {
        return Err(AppError::ProtectedSubject);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::orders::{OrderPriority, OrderStatus};
    use chrono::Utc;

    fn user(role: UserRole, org: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            organization_id: org,
            name: "Teste".into(),
            email: "teste@exemplo.com".into(),
            password_hash: "x".into(),
            role,
            can_view_all: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order(org: Uuid, assigned_to: Option<Uuid>) -> ServiceOrder {
        ServiceOrder {
            id: Uuid::new_v4(),
            organization_id: org,
            customer_id: None,
            title: "OS".into(),
            description: None,
            status: OrderStatus::Pendente,
            priority: OrderPriority::Media,
            assigned_to,
            assigned_by: Uuid::new_v4(),
            scheduled_at: None,
            closing_reason: None,
            reopen_reason: None,
            closed_at: None,
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_passa_em_qualquer_organizacao() {
        let admin = user(UserRole::Admin, None);
        let os = order(Uuid::new_v4(), None);
        for action in [
            OrderAction::Read,
            OrderAction::Edit,
            OrderAction::ChangeStatus,
            OrderAction::Transfer,
            OrderAction::Delete,
        ] {
            assert!(authorize_order(&admin, &os, action).is_ok());
        }
        assert!(authorize_management(&admin, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn organizacao_errada_nega_antes_do_papel() {
        let os = order(Uuid::new_v4(), None);
        // Até o owner de OUTRA organização é barrado com o motivo correto
        for role in [
            UserRole::Owner,
            UserRole::Manager,
            UserRole::Technician,
            UserRole::Assistant,
        ] {
            let u = user(role, Some(Uuid::new_v4()));
            for action in [OrderAction::Read, OrderAction::Edit, OrderAction::Delete] {
                let err = authorize_order(&u, &os, action).unwrap_err();
                assert!(matches!(err, AppError::WrongOrganization), "{role:?}/{action:?}");
            }
        }
    }

    #[test]
    fn tecnico_le_apenas_as_suas_ou_com_flag() {
        let org = Uuid::new_v4();
        let mut tecnico = user(UserRole::Technician, Some(org));
        let os_de_outro = order(org, Some(Uuid::new_v4()));

        let err = authorize_order(&tecnico, &os_de_outro, OrderAction::Read).unwrap_err();
        assert!(matches!(err, AppError::InsufficientRole));

        // Flag "vê todas" libera leitura, mas não escrita
        tecnico.can_view_all = true;
        assert!(authorize_order(&tecnico, &os_de_outro, OrderAction::Read).is_ok());
        let err = authorize_order(&tecnico, &os_de_outro, OrderAction::Edit).unwrap_err();
        assert!(matches!(err, AppError::InsufficientRole));
    }

    #[test]
    fn responsavel_edita_mas_nao_exclui() {
        let org = Uuid::new_v4();
        let tecnico = user(UserRole::Technician, Some(org));
        let os = order(org, Some(tecnico.id));

        assert!(authorize_order(&tecnico, &os, OrderAction::Read).is_ok());
        assert!(authorize_order(&tecnico, &os, OrderAction::Edit).is_ok());
        assert!(authorize_order(&tecnico, &os, OrderAction::ChangeStatus).is_ok());
        assert!(authorize_order(&tecnico, &os, OrderAction::Transfer).is_ok());

        let err = authorize_order(&tecnico, &os, OrderAction::Delete).unwrap_err();
        assert!(matches!(err, AppError::InsufficientRole));
    }

    #[test]
    fn gestao_de_equipe_exige_papel_de_gestao() {
        let org = Uuid::new_v4();
        assert!(authorize_management(&user(UserRole::Owner, Some(org)), org).is_ok());
        assert!(authorize_management(&user(UserRole::Manager, Some(org)), org).is_ok());

        for role in [UserRole::Technician, UserRole::Assistant] {
            let err = authorize_management(&user(role, Some(org)), org).unwrap_err();
            assert!(matches!(err, AppError::InsufficientRole));
        }
    }

    #[test]
    fn proprietario_so_e_alterado_pelo_admin() {
        let org = Uuid::new_v4();
        let owner = user(UserRole::Owner, Some(org));
        let manager = user(UserRole::Manager, Some(org));
        let admin = user(UserRole::Admin, None);

        let err = authorize_member_update(&manager, &owner).unwrap_err();
        assert!(matches!(err, AppError::ProtectedSubject));

        // Nem o próprio owner escapa da regra
        let err = authorize_member_update(&owner, &owner).unwrap_err();
        assert!(matches!(err, AppError::ProtectedSubject));

        assert!(authorize_member_update(&admin, &owner).is_ok());
    }

    #[test]
    fn gestor_altera_membros_comuns_da_propria_organizacao() {
        let org = Uuid::new_v4();
        let manager = user(UserRole::Manager, Some(org));
        let tecnico = user(UserRole::Technician, Some(org));
        assert!(authorize_member_update(&manager, &tecnico).is_ok());

        let de_fora = user(UserRole::Manager, Some(Uuid::new_v4()));
        let err = authorize_member_update(&de_fora, &tecnico).unwrap_err();
        assert!(matches!(err, AppError::WrongOrganization));
    }
}
