// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Reported when a backup request starts.
pub(super) const BACKUP_EVENT: &str = "backup_request";

/// Reported when the backup completed before the primary.
pub(super) const BACKUP_WON_EVENT: &str = "backup_request_won";
