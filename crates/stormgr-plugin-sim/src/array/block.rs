//! Volumes, masking and access groups.

use stormgr_types::{
    AccessGroup, AdminState, ErrorCode, InitiatorType, PoolElementType, PoolUnsupportedAction,
    Provisioning, RaidInfo, ReplicationType, StorageError, Volume,
};

use super::{BLOCK_SIZE, ChapCredentials, SimArray, no_state_change, not_found};

impl SimArray {
    /// Lists volumes.
    #[must_use]
    pub fn volumes(&self) -> Vec<Volume> {
        self.volumes.clone()
    }

    fn volume_index(&self, volume_id: &str) -> Result<usize, StorageError> {
        self.volumes
            .iter()
            .position(|volume| volume.id == volume_id)
            .ok_or_else(|| not_found(ErrorCode::NotFoundVolume, "volume", volume_id))
    }

    fn volume(&self, volume_id: &str) -> Result<&Volume, StorageError> {
        let index = self.volume_index(volume_id)?;
        self.volumes
            .get(index)
            .ok_or_else(|| not_found(ErrorCode::NotFoundVolume, "volume", volume_id))
    }

    fn volume_mut(&mut self, volume_id: &str) -> Result<&mut Volume, StorageError> {
        self.volumes
            .iter_mut()
            .find(|volume| volume.id == volume_id)
            .ok_or_else(|| not_found(ErrorCode::NotFoundVolume, "volume", volume_id))
    }

    fn check_volume_name(&self, name: &str) -> Result<(), StorageError> {
        let taken = self.volumes.iter().any(|volume| volume.name == name);
        self.check_name("volume", taken, name)
    }

    fn new_volume(&mut self, pool_id: &str, name: &str, size_bytes: u64) -> Volume {
        let id = self.allocate("VOL");
        Volume {
            vpd83: format!("600508b1{:024x}", self.last_id),
            id,
            name: name.to_owned(),
            block_size: BLOCK_SIZE,
            num_of_blocks: size_bytes.div_ceil(BLOCK_SIZE),
            admin_state: AdminState::Enabled,
            system_id: self.system.id.clone(),
            pool_id: pool_id.to_owned(),
            plugin_data: None,
        }
    }

    /// Creates a volume of at least `size_bytes`, rounded up to whole blocks.
    ///
    /// # Errors
    ///
    /// Fails for an unknown pool, a taken or empty name, a zero size, a
    /// pool that cannot host the provisioning, or insufficient free space.
    pub fn volume_create(
        &mut self,
        pool_id: &str,
        name: &str,
        size_bytes: u64,
        provisioning: Provisioning,
    ) -> Result<Volume, StorageError> {
        if size_bytes == 0 {
            return Err(StorageError::invalid_argument(
                "volume size must be greater than zero",
            ));
        }
        self.check_volume_name(name)?;
        let element = match provisioning {
            Provisioning::Thin => PoolElementType::VolumeThin,
            Provisioning::Full => PoolElementType::VolumeFull,
            Provisioning::Default | Provisioning::Unknown => PoolElementType::Volume,
        };
        let rounded = size_bytes.div_ceil(BLOCK_SIZE).saturating_mul(BLOCK_SIZE);
        self.reserve(pool_id, element, rounded)?;
        let volume = self.new_volume(pool_id, name, size_bytes);
        self.volumes.push(volume.clone());
        Ok(volume)
    }

    /// Grows or shrinks a volume.
    ///
    /// # Errors
    ///
    /// `NoStateChange` when the size is unchanged, `NoSupport` when the pool
    /// refuses the direction, `NotEnoughSpace` when growth does not fit.
    pub fn volume_resize(
        &mut self,
        volume_id: &str,
        new_size_bytes: u64,
    ) -> Result<Volume, StorageError> {
        if new_size_bytes == 0 {
            return Err(StorageError::invalid_argument(
                "volume size must be greater than zero",
            ));
        }
        let current = self.volume(volume_id)?.clone();
        let blocks = new_size_bytes.div_ceil(BLOCK_SIZE);
        if blocks == current.num_of_blocks {
            return Err(no_state_change(format!(
                "volume {volume_id} is already {} bytes",
                current.size_bytes()
            )));
        }
        let unsupported = self.pool(&current.pool_id)?.unsupported_actions;
        let wanted = blocks.saturating_mul(BLOCK_SIZE);
        if wanted > current.size_bytes() {
            if unsupported.contains(PoolUnsupportedAction::VolumeGrow) {
                return Err(StorageError::no_support(format!(
                    "pool {} cannot grow volumes",
                    current.pool_id
                )));
            }
            self.reserve(
                &current.pool_id,
                PoolElementType::Volume,
                wanted.saturating_sub(current.size_bytes()),
            )?;
        } else if unsupported.contains(PoolUnsupportedAction::VolumeShrink) {
            return Err(StorageError::no_support(format!(
                "pool {} cannot shrink volumes",
                current.pool_id
            )));
        }
        let volume = self.volume_mut(volume_id)?;
        volume.num_of_blocks = blocks;
        Ok(volume.clone())
    }

    /// Deletes a volume.
    ///
    /// # Errors
    ///
    /// `IsMasked` while any access group can reach the volume; a volume
    /// that replicas still depend on is refused as an invalid argument.
    pub fn volume_delete(&mut self, volume_id: &str) -> Result<(), StorageError> {
        let index = self.volume_index(volume_id)?;
        if self.masks.iter().any(|(_, masked)| masked == volume_id) {
            return Err(StorageError::new(
                ErrorCode::IsMasked,
                format!("volume {volume_id} is masked to an access group"),
            ));
        }
        if self.has_child_dependency(volume_id) {
            return Err(StorageError::invalid_argument(format!(
                "volume {volume_id} has dependent replicas"
            )));
        }
        self.volumes.remove(index);
        self.dependencies.remove(volume_id);
        Ok(())
    }

    /// Replicates `source_id` into `pool_id`, or into the source pool.
    ///
    /// Point-in-time clones keep sharing blocks with the source until the
    /// dependency is removed.
    ///
    /// # Errors
    ///
    /// Mirrors are unsupported; otherwise fails like [`Self::volume_create`].
    pub fn volume_replicate(
        &mut self,
        pool_id: Option<&str>,
        replication: ReplicationType,
        source_id: &str,
        name: &str,
    ) -> Result<Volume, StorageError> {
        let source = self.volume(source_id)?.clone();
        match replication {
            ReplicationType::PointInTimeClone | ReplicationType::FullCopy => {}
            other => {
                return Err(StorageError::no_support(format!(
                    "replication type {other:?} is not supported"
                )));
            }
        }
        self.check_volume_name(name)?;
        let pool_id = pool_id.unwrap_or(&source.pool_id).to_owned();
        self.reserve(&pool_id, PoolElementType::Volume, source.size_bytes())?;
        let replica = self.new_volume(&pool_id, name, source.size_bytes());
        if replication == ReplicationType::PointInTimeClone {
            self.dependencies
                .insert(replica.id.clone(), source.id.clone());
        }
        self.volumes.push(replica.clone());
        Ok(replica)
    }

    /// Sets a volume's administrative state.
    ///
    /// # Errors
    ///
    /// `NoStateChange` when the volume is already in `state`.
    pub fn volume_set_state(
        &mut self,
        volume_id: &str,
        state: AdminState,
    ) -> Result<(), StorageError> {
        let volume = self.volume_mut(volume_id)?;
        if volume.admin_state == state {
            return Err(no_state_change(format!(
                "volume {volume_id} is already {state:?}"
            )));
        }
        volume.admin_state = state;
        Ok(())
    }

    /// RAID geometry of the pool backing a volume.
    ///
    /// # Errors
    ///
    /// `NotFoundVolume` for an unknown volume.
    pub fn volume_raid_info(&self, volume_id: &str) -> Result<RaidInfo, StorageError> {
        let volume = self.volume(volume_id)?;
        Ok(self.raid_info_for_pool(&volume.pool_id))
    }

    fn has_child_dependency(&self, volume_id: &str) -> bool {
        self.dependencies.values().any(|source| source == volume_id)
    }

    /// Reports whether clones still share blocks with `volume_id`.
    ///
    /// # Errors
    ///
    /// `NotFoundVolume` for an unknown volume.
    pub fn volume_child_dependency(&self, volume_id: &str) -> Result<bool, StorageError> {
        self.volume(volume_id)?;
        Ok(self.has_child_dependency(volume_id))
    }

    /// Detaches every clone of `volume_id`.
    ///
    /// # Errors
    ///
    /// `NoStateChange` when nothing depends on the volume.
    pub fn volume_child_dependency_rm(&mut self, volume_id: &str) -> Result<(), StorageError> {
        self.volume(volume_id)?;
        if !self.has_child_dependency(volume_id) {
            return Err(no_state_change(format!(
                "no volume depends on {volume_id}"
            )));
        }
        self.dependencies.retain(|_, source| source != volume_id);
        Ok(())
    }

    /// Lists access groups.
    #[must_use]
    pub fn access_groups(&self) -> Vec<AccessGroup> {
        self.access_groups.clone()
    }

    fn access_group(&self, group_id: &str) -> Result<&AccessGroup, StorageError> {
        self.access_groups
            .iter()
            .find(|group| group.id == group_id)
            .ok_or_else(|| not_found(ErrorCode::NotFoundAccessGroup, "access group", group_id))
    }

    fn access_group_mut(&mut self, group_id: &str) -> Result<&mut AccessGroup, StorageError> {
        self.access_groups
            .iter_mut()
            .find(|group| group.id == group_id)
            .ok_or_else(|| not_found(ErrorCode::NotFoundAccessGroup, "access group", group_id))
    }

    fn owner_of(&self, init_id: &str) -> Option<&AccessGroup> {
        self.access_groups
            .iter()
            .find(|group| group.init_ids.iter().any(|member| member == init_id))
    }

    /// Masks a volume to an access group.
    ///
    /// # Errors
    ///
    /// `NoStateChange` when the mask already exists.
    pub fn volume_mask(&mut self, group_id: &str, volume_id: &str) -> Result<(), StorageError> {
        self.access_group(group_id)?;
        self.volume(volume_id)?;
        if !self
            .masks
            .insert((group_id.to_owned(), volume_id.to_owned()))
        {
            return Err(no_state_change(format!(
                "volume {volume_id} is already masked to {group_id}"
            )));
        }
        Ok(())
    }

    /// Removes a mask.
    ///
    /// # Errors
    ///
    /// `NoStateChange` when the mask does not exist.
    pub fn volume_unmask(&mut self, group_id: &str, volume_id: &str) -> Result<(), StorageError> {
        self.access_group(group_id)?;
        self.volume(volume_id)?;
        if !self
            .masks
            .remove(&(group_id.to_owned(), volume_id.to_owned()))
        {
            return Err(no_state_change(format!(
                "volume {volume_id} is not masked to {group_id}"
            )));
        }
        Ok(())
    }

    /// Volumes masked to an access group.
    ///
    /// # Errors
    ///
    /// `NotFoundAccessGroup` for an unknown group.
    pub fn volumes_accessible_by_access_group(
        &self,
        group_id: &str,
    ) -> Result<Vec<Volume>, StorageError> {
        self.access_group(group_id)?;
        Ok(self
            .volumes
            .iter()
            .filter(|volume| {
                self.masks
                    .contains(&(group_id.to_owned(), volume.id.clone()))
            })
            .cloned()
            .collect())
    }

    /// Access groups a volume is masked to.
    ///
    /// # Errors
    ///
    /// `NotFoundVolume` for an unknown volume.
    pub fn access_groups_granted_to_volume(
        &self,
        volume_id: &str,
    ) -> Result<Vec<AccessGroup>, StorageError> {
        self.volume(volume_id)?;
        Ok(self
            .access_groups
            .iter()
            .filter(|group| {
                self.masks
                    .contains(&(group.id.clone(), volume_id.to_owned()))
            })
            .cloned()
            .collect())
    }

    /// Creates an access group holding one initiator.
    ///
    /// # Errors
    ///
    /// Fails for an unknown system, a malformed initiator, a taken name, or
    /// an initiator that already belongs to a group.
    pub fn access_group_create(
        &mut self,
        name: &str,
        init_id: &str,
        init_type: InitiatorType,
        system_id: &str,
    ) -> Result<AccessGroup, StorageError> {
        self.check_system(system_id)?;
        let init_id = normalize_initiator(init_id, init_type)?;
        let taken = self.access_groups.iter().any(|group| group.name == name);
        self.check_name("access group", taken, name)?;
        if let Some(owner) = self.owner_of(&init_id) {
            return Err(StorageError::new(
                ErrorCode::ExistsInitiator,
                format!("initiator {init_id} already belongs to {}", owner.id),
            ));
        }
        let group = AccessGroup {
            id: self.allocate("AG"),
            name: name.to_owned(),
            init_ids: vec![init_id],
            init_type,
            system_id: self.system.id.clone(),
            plugin_data: None,
        };
        self.access_groups.push(group.clone());
        Ok(group)
    }

    /// Deletes an access group.
    ///
    /// # Errors
    ///
    /// `IsMasked` while volumes are still masked to the group.
    pub fn access_group_delete(&mut self, group_id: &str) -> Result<(), StorageError> {
        self.access_group(group_id)?;
        if self.masks.iter().any(|(group, _)| group == group_id) {
            return Err(StorageError::new(
                ErrorCode::IsMasked,
                format!("access group {group_id} still has masked volumes"),
            ));
        }
        self.access_groups.retain(|group| group.id != group_id);
        Ok(())
    }

    /// Adds an initiator to a group.
    ///
    /// Mixing iSCSI and FC members turns the group into a mixed group.
    ///
    /// # Errors
    ///
    /// `NoStateChange` if the initiator is already a member,
    /// `ExistsInitiator` if another group owns it.
    pub fn access_group_initiator_add(
        &mut self,
        group_id: &str,
        init_id: &str,
        init_type: InitiatorType,
    ) -> Result<AccessGroup, StorageError> {
        self.access_group(group_id)?;
        let init_id = normalize_initiator(init_id, init_type)?;
        if let Some(owner) = self.owner_of(&init_id) {
            return Err(if owner.id == group_id {
                no_state_change(format!("initiator {init_id} is already in {group_id}"))
            } else {
                StorageError::new(
                    ErrorCode::ExistsInitiator,
                    format!("initiator {init_id} already belongs to {}", owner.id),
                )
            });
        }
        let group = self.access_group_mut(group_id)?;
        if group.init_type != init_type {
            group.init_type = InitiatorType::IscsiWwpnMixed;
        }
        group.init_ids.push(init_id);
        Ok(group.clone())
    }

    /// Removes an initiator from a group.
    ///
    /// # Errors
    ///
    /// `NoStateChange` if it is not a member, `LastInitInAccessGroup` if it
    /// is the only one.
    pub fn access_group_initiator_delete(
        &mut self,
        group_id: &str,
        init_id: &str,
        init_type: InitiatorType,
    ) -> Result<AccessGroup, StorageError> {
        let init_id = normalize_initiator(init_id, init_type)?;
        let group = self.access_group_mut(group_id)?;
        let Some(position) = group.init_ids.iter().position(|member| *member == init_id) else {
            return Err(no_state_change(format!(
                "initiator {init_id} is not in {group_id}"
            )));
        };
        if group.init_ids.len() == 1 {
            return Err(StorageError::new(
                ErrorCode::LastInitInAccessGroup,
                format!("initiator {init_id} is the last member of {group_id}"),
            ));
        }
        group.init_ids.remove(position);
        Ok(group.clone())
    }

    /// Records CHAP credentials for an iSCSI initiator.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when a user arrives without its secret or the other
    /// way round.
    pub fn iscsi_chap_auth(
        &mut self,
        init_id: &str,
        inbound: (Option<String>, Option<String>),
        outbound: (Option<String>, Option<String>),
    ) -> Result<(), StorageError> {
        let init_id = normalize_initiator(init_id, InitiatorType::IscsiIqn)?;
        let credentials = ChapCredentials {
            inbound: pair_credentials("inbound", inbound)?,
            outbound: pair_credentials("outbound", outbound)?,
        };
        if credentials.outbound.is_some() && credentials.inbound.is_none() {
            return Err(StorageError::invalid_argument(
                "outbound CHAP requires inbound credentials",
            ));
        }
        self.chap.insert(init_id, credentials);
        Ok(())
    }

    /// CHAP credentials recorded for an initiator.
    #[must_use]
    pub fn chap(&self, init_id: &str) -> Option<&ChapCredentials> {
        self.chap.get(init_id)
    }
}

fn pair_credentials(
    direction: &str,
    (user, secret): (Option<String>, Option<String>),
) -> Result<Option<(String, String)>, StorageError> {
    match (user, secret) {
        (None, None) => Ok(None),
        (Some(user), Some(secret)) if !user.is_empty() => Ok(Some((user, secret))),
        _ => Err(StorageError::invalid_argument(format!(
            "{direction} CHAP needs both a user and a secret"
        ))),
    }
}

// Returns the canonical spelling of an initiator id.
fn normalize_initiator(init_id: &str, init_type: InitiatorType) -> Result<String, StorageError> {
    let invalid = || {
        StorageError::invalid_argument(format!(
            "{init_id:?} is not a valid {init_type:?} initiator"
        ))
    };
    match init_type {
        InitiatorType::IscsiIqn => {
            let lower = init_id.to_ascii_lowercase();
            let well_formed = (lower.starts_with("iqn.") || lower.starts_with("eui."))
                && !lower.contains(char::is_whitespace);
            well_formed.then_some(lower).ok_or_else(invalid)
        }
        InitiatorType::Wwpn => {
            let digits: String = init_id
                .chars()
                .filter(|ch| !matches!(ch, ':' | '-'))
                .collect();
            if digits.len() != 16 || !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            Ok(digits.to_ascii_lowercase())
        }
        _ => Err(invalid()),
    }
}
