use crate::coords::Color;

use super::types::{DrawListId, IndexArrayId, PipelineId, ScreenId, UniformSetId};

/// Command captured while a screen draw list is open.
#[derive(Debug, Clone)]
pub(crate) enum RecordedCommand {
    Pipeline(PipelineId),
    IndexArray(IndexArrayId),
    UniformSet { set: UniformSetId, set_index: u32 },
    /// Index into [`RecordedDrawList::push_constants`].
    PushConstant(usize),
    Draw { use_indices: bool },
}

/// A screen pass recorded by `WgpuDevice`, replayed at `draw_list_end`.
///
/// wgpu render passes borrow their encoder, so the immediate-style draw-list
/// calls are buffered and encoded in one go.
#[derive(Debug)]
pub(crate) struct RecordedDrawList {
    pub id: DrawListId,
    pub screen: ScreenId,
    pub clear: Color,
    pub commands: Vec<RecordedCommand>,
    pub push_constants: Vec<Vec<u8>>,
}

impl RecordedDrawList {
    pub fn new(id: DrawListId, screen: ScreenId, clear: Color) -> Self {
        Self {
            id,
            screen,
            clear,
            commands: Vec::new(),
            push_constants: Vec::new(),
        }
    }

    pub fn push_constant(&mut self, data: &[u8]) {
        self.push_constants.push(data.to_vec());
        self.commands
            .push(RecordedCommand::PushConstant(self.push_constants.len() - 1));
    }

    /// Largest push block, rounded up to 16 bytes (uniform binding size).
    pub fn push_block_size(&self) -> usize {
        let max = self.push_constants.iter().map(Vec::len).max().unwrap_or(0);
        max.max(16).next_multiple_of(16)
    }

    /// Packs every push block into one buffer at `stride`-aligned offsets.
    pub fn packed_push_constants(&self, stride: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; stride * self.push_constants.len().max(1)];
        for (slot, block) in self.push_constants.iter().enumerate() {
            let start = slot * stride;
            bytes[start..start + block.len()].copy_from_slice(block);
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_constants_are_packed_at_stride() {
        let mut list = RecordedDrawList::new(DrawListId(1), ScreenId::MAIN, Color::BLACK);
        list.push_constant(&[1, 2, 3]);
        list.push_constant(&[4]);

        assert_eq!(list.push_block_size(), 16);
        let packed = list.packed_push_constants(256);
        assert_eq!(packed.len(), 512);
        assert_eq!(&packed[0..3], &[1, 2, 3]);
        assert_eq!(packed[256], 4);
        assert!(matches!(list.commands[1], RecordedCommand::PushConstant(1)));
    }
}
