//! Comment use-case service.
//!
//! # Invariants
//! - Comments can be created by any authenticated identity on an existing
//!   article, and deleted only by their author.
//! - There is no comment update path.

use crate::identity::Identity;
use crate::model::article::ArticleId;
use crate::model::comment::{Comment, CommentId, NewComment};
use crate::repo::comment_repo::CommentRepository;
use crate::repo::RecordKind;
use crate::service::error::ContentError;
use crate::service::log_outcome;

pub struct CommentService<R: CommentRepository> {
    repo: R,
}

impl<R: CommentRepository> CommentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_comment(
        &mut self,
        actor: &Identity,
        article_id: ArticleId,
        comment: &NewComment,
    ) -> Result<Comment, ContentError> {
        let result = self
            .repo
            .create_comment(actor, article_id, comment)
            .map_err(ContentError::from)
            .and_then(|id| {
                self.repo
                    .get_comment(id)?
                    .ok_or(ContentError::InconsistentState(
                        "created comment not found in read-back",
                    ))
            });
        log_outcome("comment_create", actor, Some(article_id), &result);
        result
    }

    pub fn get_comment(&self, id: CommentId) -> Result<Comment, ContentError> {
        self.repo
            .get_comment(id)?
            .ok_or(ContentError::NotFound {
                kind: RecordKind::Comment,
                id,
            })
    }

    /// Comments of one article in creation order.
    pub fn comments_for(&self, article_id: ArticleId) -> Result<Vec<Comment>, ContentError> {
        Ok(self.repo.list_comments_for(article_id)?)
    }

    /// Deletes a comment. Author only.
    pub fn delete_comment(&mut self, actor: &Identity, id: CommentId) -> Result<(), ContentError> {
        let result = self
            .repo
            .delete_comment(actor, id)
            .map_err(ContentError::from);
        log_outcome("comment_delete", actor, Some(id), &result);
        result
    }
}
